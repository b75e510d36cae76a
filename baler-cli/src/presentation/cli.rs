use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "baler: resumable directory archiver", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pack a directory into a compressed tar archive
    Pack {
        /// Directory to archive
        input_dir: PathBuf,

        /// Destination archive path; the codec suffix is appended
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Split the finished archive into chunks
        #[arg(long)]
        split: bool,

        /// Chunk size in MB for --split
        #[arg(
            short = 's',
            long = "chunk-size",
            env = "BALER_CHUNK_SIZE_MB",
            default_value_t = 1000
        )]
        chunk_size: u64,

        /// Compression codec: gzip or zstd
        #[arg(long, default_value = "gzip")]
        codec: String,

        /// Compression level; 0 means the codec default
        #[arg(long, default_value_t = 0)]
        level: i32,
    },

    /// Split a file into fixed-size chunks
    Split {
        /// File to split
        file: PathBuf,

        /// Chunk size in MB
        #[arg(
            short = 's',
            long = "chunk-size",
            env = "BALER_CHUNK_SIZE_MB",
            default_value_t = 1000
        )]
        chunk_size: u64,

        /// Where the chunk directory goes; defaults to the file's parent
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Reassemble chunks back into the original file
    Merge {
        /// Directory holding the chunks
        chunks_dir: PathBuf,

        /// Output file; defaults to the original name next to the chunk directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
