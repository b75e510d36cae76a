#![forbid(unsafe_code)]

pub mod error;
pub mod policy;

pub mod codec;

pub mod archive;

pub mod manifest;

pub mod chunking {
    pub mod assembler;
    pub mod splitter;
    pub mod suffix;
}

pub mod pack {
    pub mod walker;
    pub mod writer;
}

/// Progress callback: (units done, units expected, current item name).
/// Callbacks may borrow from the caller's scope.
pub type ProgressFn<'a> = dyn Fn(u64, u64, &str) + Send + Sync + 'a;

// Re-exports: stable API surface
pub use chunking::assembler::{ReassemblyResult, merge};
pub use chunking::splitter::{ChunkSet, SplitOptions, split};
pub use pack::writer::{ArchiveResult, FailedAppend, PackOptions, pack};
