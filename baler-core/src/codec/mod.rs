use crate::error::Result;
use std::io::{Read, Write};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CodecId {
    #[default]
    Gzip,
    Zstd,
}

impl CodecId {
    pub fn parse(s: &str) -> Option<CodecId> {
        match s {
            "gzip" | "gz" => Some(CodecId::Gzip),
            "zstd" | "zst" => Some(CodecId::Zstd),
            _ => None,
        }
    }

    pub fn compressor(self) -> &'static dyn Compressor {
        match self {
            CodecId::Gzip => &gzipc::GzipCompressor,
            CodecId::Zstd => &zstdc::ZstdCompressor,
        }
    }
}

pub trait Compressor: Send + Sync {
    fn id(&self) -> CodecId;
    /// Suffix appended to the uncompressed archive path, e.g. ".gz".
    fn suffix(&self) -> &'static str;
    fn compress(&self, src: &mut dyn Read, dst: &mut dyn Write, level: i32) -> Result<u64>;
    fn decompress(&self, src: &mut dyn Read, dst: &mut dyn Write) -> Result<u64>;
}

pub mod gzipc;
pub mod zstdc;
