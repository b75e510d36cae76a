use crate::error::Result;
use std::path::Path;

/// Append-only archive seam. The pack writer drives the job through
/// this surface; the container format lives behind it.
pub trait ArchiveWriter {
    /// Append the file at `src` under the entry name `rel`.
    fn append(&mut self, src: &Path, rel: &Path) -> Result<()>;
    /// Byte length of valid content written so far.
    fn written_len(&mut self) -> Result<u64>;
    /// Drop everything past `len`, e.g. a half-written entry before a retry.
    fn truncate(&mut self, len: u64) -> Result<()>;
    /// Write the end-of-archive marker and flush to disk.
    fn finish(&mut self) -> Result<()>;
}

pub mod tarball;
