use crate::error::Result;
use crate::manifest::{SPLIT_MANIFEST_NAME, write_atomic};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const BYTES_PER_GB: f64 = (1024u64 * 1024 * 1024) as f64;

/// Sidecar describing one chunk set, written only after every chunk is
/// on disk. Its absence marks the split as not to be trusted.
///
/// `chunk_size_mb` and `total_size_gb` are kept for operators skimming
/// the JSON; validation runs on the byte-exact fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitManifest {
    pub original_file: String,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub chunk_size_mb: u64,
    pub total_size_gb: f64,
    #[serde(default)]
    pub chunk_size_bytes: u64,
    #[serde(default)]
    pub total_size_bytes: u64,
    /// Zero means unknown (a manifest written by something else);
    /// reassembly then falls back to contiguity-only validation.
    #[serde(default)]
    pub chunk_count: u64,
    pub output_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_blake3: Option<String>,
}

impl SplitManifest {
    pub fn new(
        original: &Path,
        out_dir: &Path,
        chunk_size_bytes: u64,
        total_size_bytes: u64,
        chunk_count: u64,
        source_blake3: String,
    ) -> Result<Self> {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        Ok(Self {
            original_file: original.to_string_lossy().to_string(),
            timestamp,
            chunk_size_mb: chunk_size_bytes / (1024 * 1024),
            total_size_gb: total_size_bytes as f64 / BYTES_PER_GB,
            chunk_size_bytes,
            total_size_bytes,
            chunk_count,
            output_dir: out_dir.to_string_lossy().to_string(),
            source_blake3: Some(source_blake3),
        })
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(SPLIT_MANIFEST_NAME);
        let bytes = serde_json::to_vec_pretty(self)?;
        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    /// Read `split_info.json` from `dir` if present.
    pub fn read_from(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(SPLIT_MANIFEST_NAME);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
