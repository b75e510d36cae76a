use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BalerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing input: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("chunk size must be positive")]
    InvalidChunkSize,

    #[error("compression to {} failed: {source}", .path.display())]
    CompressionFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("chunk write failed at {}: {detail}", .path.display())]
    ChunkWriteFailure { path: PathBuf, detail: String },

    #[error("no chunks found in {}", .0.display())]
    NoChunks(PathBuf),

    #[error("chunk sequence broken in {}: {detail}", .dir.display())]
    ReassemblyGap { dir: PathBuf, detail: String },

    #[error("reassembled {actual} bytes, manifest says {expected}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, BalerError>;
