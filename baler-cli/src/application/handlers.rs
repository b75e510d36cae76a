use baler_core::codec::CodecId;
use baler_core::error::Result;
use baler_core::{PackOptions, SplitOptions, merge, pack, split};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

fn make_progress_bar(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Bridge a core progress callback onto a bar. The total arrives with
/// the first tick, once the core has counted its work.
fn bar_callback(bar: &ProgressBar) -> impl Fn(u64, u64, &str) + Send + Sync + '_ {
    move |done, total, name| {
        if bar.length() != Some(total) {
            bar.set_length(total);
        }
        bar.set_position(done);
        bar.set_message(name.to_string());
    }
}

pub fn handle_pack(
    input_dir: PathBuf,
    output: Option<PathBuf>,
    split_after: bool,
    chunk_size: u64,
    codec: String,
    level: i32,
) -> Result<()> {
    let Some(dest) = output else {
        eprintln!("pack: missing -o/--output (destination archive path)");
        std::process::exit(1);
    };
    let Some(codec) = CodecId::parse(&codec) else {
        eprintln!("pack: unknown codec {codec:?} (expected gzip or zstd)");
        std::process::exit(1);
    };

    let opts = PackOptions {
        codec,
        level,
        ..Default::default()
    };
    let bar = make_progress_bar("pack");
    let cb = bar_callback(&bar);
    let res = pack(&input_dir, &dest, &opts, Some(&cb))?;
    bar.finish_and_clear();

    eprintln!(
        "pack: {} -> {} ({} files, {} appended, {} skipped)",
        input_dir.display(),
        res.final_path.display(),
        res.file_count,
        res.appended,
        res.skipped
    );
    for f in &res.failed {
        eprintln!("pack: failed {}: {}", f.path.display(), f.reason);
    }

    if split_after {
        handle_split(res.final_path, chunk_size, None)?;
    }
    Ok(())
}

pub fn handle_split(file: PathBuf, chunk_size: u64, output_dir: Option<PathBuf>) -> Result<()> {
    let mut opts = SplitOptions::from_mb(chunk_size);
    opts.output_dir = output_dir;

    let bar = make_progress_bar("split");
    let cb = bar_callback(&bar);
    let set = split(&file, &opts, Some(&cb))?;
    bar.finish_and_clear();

    eprintln!(
        "split: {} -> {} ({} chunks)",
        file.display(),
        set.manifest.output_dir,
        set.chunks.len()
    );
    Ok(())
}

pub fn handle_merge(chunks_dir: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let bar = make_progress_bar("merge");
    let cb = bar_callback(&bar);
    let res = merge(&chunks_dir, output.as_deref(), Some(&cb))?;
    bar.finish_and_clear();

    eprintln!(
        "merge: {} -> {} ({} chunks, {} bytes{})",
        chunks_dir.display(),
        res.output_path.display(),
        res.chunks,
        res.bytes,
        if res.verified { ", verified" } else { "" }
    );
    Ok(())
}
