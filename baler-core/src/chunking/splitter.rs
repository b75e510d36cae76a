use crate::ProgressFn;
use crate::chunking::suffix;
use crate::error::{BalerError, Result};
use crate::manifest::SPLIT_MANIFEST_NAME;
use crate::manifest::split::SplitManifest;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_CHUNK_SIZE_MB: u64 = 1000;
const IO_BUF: usize = 1 << 20;

#[derive(Clone, Debug)]
pub struct SplitOptions {
    pub chunk_size_bytes: u64,
    /// Chunks land in `<output_dir>/<stem>_splits`; defaults to the
    /// source file's parent.
    pub output_dir: Option<PathBuf>,
}

impl SplitOptions {
    pub fn from_mb(mb: u64) -> Self {
        Self {
            chunk_size_bytes: mb.saturating_mul(1024 * 1024),
            output_dir: None,
        }
    }
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self::from_mb(DEFAULT_CHUNK_SIZE_MB)
    }
}

/// What one split produced: the manifest plus chunk paths in emission
/// order.
#[derive(Debug)]
pub struct ChunkSet {
    pub manifest: SplitManifest,
    pub manifest_path: PathBuf,
    pub chunks: Vec<PathBuf>,
}

/// Split `file` into fixed-size chunks named `<stem>_part_aa`, `_ab`,
/// ... inside `<stem>_splits`. The manifest is written only after every
/// chunk is on disk; a run that dies earlier leaves chunks but no
/// manifest, which marks the set as incomplete.
pub fn split(
    file: &Path,
    opts: &SplitOptions,
    progress: Option<&ProgressFn<'_>>,
) -> Result<ChunkSet> {
    if opts.chunk_size_bytes == 0 {
        return Err(BalerError::InvalidChunkSize);
    }
    if !file.is_file() {
        return Err(BalerError::MissingInput(file.to_path_buf()));
    }

    let stem = file_stem(file);
    let base_dir = match &opts.output_dir {
        Some(d) => d.clone(),
        None => file
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    let out_dir = base_dir.join(format!("{stem}_splits"));
    fs::create_dir_all(&out_dir)?;

    let prefix = format!("{stem}_part_");
    sweep_stale(&out_dir, &prefix)?;

    let chunk_size = opts.chunk_size_bytes;
    let total = fs::metadata(file)?.len();
    // A zero-byte source still gets one (empty) chunk.
    let expected = total.div_ceil(chunk_size).max(1);
    let width = suffix::width_for(expected);

    info!(
        file = %file.display(),
        total_bytes = total,
        chunks = expected,
        chunk_size_bytes = chunk_size,
        "splitting"
    );

    let mut src = File::open(file)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; IO_BUF];
    let mut chunks = Vec::with_capacity(expected as usize);

    for ordinal in 0..expected {
        let want = if ordinal + 1 == expected {
            total - ordinal * chunk_size
        } else {
            chunk_size
        };
        let name = format!("{prefix}{}", suffix::render(ordinal, width));
        let path = out_dir.join(&name);
        write_chunk(&mut src, &path, want, &mut buf, &mut hasher).map_err(|e| {
            BalerError::ChunkWriteFailure {
                path: path.clone(),
                detail: e.to_string(),
            }
        })?;
        debug!(chunk = %name, bytes = want, "chunk written");
        chunks.push(path);
        if let Some(p) = progress {
            p(ordinal + 1, expected, &name);
        }
    }

    let digest = hex::encode(hasher.finalize().as_bytes());
    let manifest = SplitManifest::new(file, &out_dir, chunk_size, total, expected, digest)?;
    let manifest_path = manifest.write_to(&out_dir)?;
    info!(dir = %out_dir.display(), chunks = expected, "split complete");

    Ok(ChunkSet {
        manifest,
        manifest_path,
        chunks,
    })
}

/// Copy exactly `want` bytes of `src` into a fresh chunk file, hashing
/// as it goes. A short read means the source shrank under us.
fn write_chunk(
    src: &mut File,
    path: &Path,
    want: u64,
    buf: &mut [u8],
    hasher: &mut blake3::Hasher,
) -> std::io::Result<()> {
    let mut out = File::create(path)?;
    let mut left = want;
    while left > 0 {
        let n = buf.len().min(left as usize);
        let k = src.read(&mut buf[..n])?;
        if k == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "source ended early",
            ));
        }
        hasher.update(&buf[..k]);
        out.write_all(&buf[..k])?;
        left -= k as u64;
    }
    out.sync_all()?;
    Ok(())
}

/// Remove chunk files and the manifest left by a previous split of the
/// same stem. Without this a re-split of a now-smaller source would
/// leave old tail chunks that a later merge reads as a longer
/// contiguous set.
fn sweep_stale(dir: &Path, prefix: &str) -> Result<()> {
    match fs::remove_file(dir.join(SPLIT_MANIFEST_NAME)) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(rest) = name.strip_prefix(prefix) {
            if suffix::parse(rest).is_some() {
                warn!(chunk = %name, "removing stale chunk");
                fs::remove_file(entry.path())?;
            }
        }
    }
    Ok(())
}

fn file_stem(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "chunk".to_string())
}
