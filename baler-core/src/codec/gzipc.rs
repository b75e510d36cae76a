use super::{CodecId, Compressor};
use crate::error::Result;
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};

pub struct GzipCompressor;

impl Compressor for GzipCompressor {
    fn id(&self) -> CodecId {
        CodecId::Gzip
    }

    fn suffix(&self) -> &'static str {
        ".gz"
    }

    fn compress(&self, src: &mut dyn Read, dst: &mut dyn Write, level: i32) -> Result<u64> {
        let level = if level <= 0 {
            Compression::default()
        } else {
            Compression::new((level as u32).min(9))
        };
        let mut enc = GzEncoder::new(dst, level);
        let written_uncompressed = std::io::copy(src, &mut enc)?;
        enc.try_finish()?;
        Ok(written_uncompressed)
    }

    fn decompress(&self, src: &mut dyn Read, dst: &mut dyn Write) -> Result<u64> {
        let mut dec = MultiGzDecoder::new(src);
        let written_uncompressed = std::io::copy(&mut dec, dst)?;
        Ok(written_uncompressed)
    }
}
