pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use baler_core::error::Result;
use clap::Parser;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Pack {
            input_dir,
            output,
            split,
            chunk_size,
            codec,
            level,
        } => handlers::handle_pack(input_dir, output, split, chunk_size, codec, level),
        Commands::Split {
            file,
            chunk_size,
            output_dir,
        } => handlers::handle_split(file, chunk_size, output_dir),
        Commands::Merge { chunks_dir, output } => handlers::handle_merge(chunks_dir, output),
    }
}
