use crate::ProgressFn;
use crate::archive::ArchiveWriter;
use crate::archive::tarball::TarAppender;
use crate::codec::{CodecId, Compressor};
use crate::error::{BalerError, Result};
use crate::manifest::progress::ProgressManifest;
use crate::pack::walker::walk_files;
use crate::policy::{RetryPolicy, ThreadSleeper};
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Default)]
pub struct PackOptions {
    /// Compression applied to the finished tar; gzip by default.
    pub codec: CodecId,
    /// 0 means the codec's own default level.
    pub level: i32,
    pub retry: RetryPolicy,
}

/// A file that still failed after retries. The job goes on without it.
#[derive(Debug)]
pub struct FailedAppend {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub struct ArchiveResult {
    pub final_path: PathBuf,
    /// Entries recorded in the archive at finalization.
    pub file_count: usize,
    /// Files appended by this run.
    pub appended: usize,
    /// Files already recorded by an earlier run.
    pub skipped: usize,
    pub failed: Vec<FailedAppend>,
}

/// Pack `source_dir` into `dest` (a tar path; the compression suffix is
/// appended for the final artifact). Progress is journaled after every
/// append, so a killed run resumes where it stopped: the archive is cut
/// back to the last recorded length and only unrecorded files go in.
pub fn pack(
    source_dir: &Path,
    dest: &Path,
    opts: &PackOptions,
    progress: Option<&ProgressFn<'_>>,
) -> Result<ArchiveResult> {
    if !source_dir.is_dir() {
        return Err(BalerError::MissingInput(source_dir.to_path_buf()));
    }

    let compressor = opts.codec.compressor();
    let final_path = suffixed(dest, compressor.suffix());
    let manifest_path = ProgressManifest::path_for(dest);
    let mut manifest = ProgressManifest::load_or_new(dest)?;

    // A manifest without its tar means the previous run got past
    // compression. Finished output present: just clean up. Absent: the
    // job state is gone and a silent restart would hide that.
    if manifest.is_resumed() && !dest.exists() {
        if final_path.exists() {
            let file_count = manifest.recorded_count();
            manifest.remove()?;
            info!(archive = %final_path.display(), "previous run had finished; cleaned up");
            return Ok(ArchiveResult {
                final_path,
                file_count,
                appended: 0,
                skipped: file_count,
                failed: Vec::new(),
            });
        }
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!(
                "{} refers to a missing archive; delete it to start over",
                manifest_path.display()
            ),
        )
        .into());
    }

    if manifest.is_resumed() {
        // Resuming past the end of the tar would zero-fill the gap.
        let on_disk = fs::metadata(dest)?.len();
        if manifest.archive_len() > on_disk {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "{} records {} archived bytes but {} holds only {}; delete the manifest to start over",
                    manifest_path.display(),
                    manifest.archive_len(),
                    dest.display(),
                    on_disk
                ),
            )
            .into());
        }
    }

    let mut files = walk_files(source_dir)?;
    // The archive and its manifest may live inside the source tree;
    // never pack them into themselves.
    let excluded = canonical_set(&[dest, &final_path, &manifest_path]);
    if !excluded.is_empty() {
        files.retain(|p| match p.canonicalize() {
            Ok(c) => !excluded.contains(&c),
            Err(_) => true,
        });
    }

    if manifest.is_resumed() {
        info!(
            recorded = manifest.recorded_count(),
            len = manifest.archive_len(),
            "resuming from progress manifest"
        );
    }
    info!(
        source = %source_dir.display(),
        dest = %dest.display(),
        files = files.len(),
        "packing"
    );

    let resume_len = if manifest.is_resumed() {
        Some(manifest.archive_len())
    } else {
        None
    };
    let mut ar = TarAppender::open(dest, resume_len)?;

    let sleeper = ThreadSleeper;
    let total = files.len() as u64;
    let tick = |done: u64, name: &str| {
        if let Some(p) = progress {
            p(done, total, name);
        }
    };

    let mut appended = 0usize;
    let mut skipped = 0usize;
    let mut failed: Vec<FailedAppend> = Vec::new();

    for (i, file) in files.iter().enumerate() {
        let rel = file.strip_prefix(source_dir).unwrap_or(file);
        let rel_name = rel.to_string_lossy();

        // Manifest keys are canonical so respellings of the source path
        // still hit on resume.
        let canon = match file.canonicalize() {
            Ok(c) => c,
            Err(e) => {
                warn!(file = %rel.display(), error = %e, "cannot resolve; skipping");
                failed.push(FailedAppend {
                    path: file.clone(),
                    reason: e.to_string(),
                });
                tick(i as u64 + 1, &rel_name);
                continue;
            }
        };

        if manifest.contains(&canon) {
            skipped += 1;
            debug!(file = %rel.display(), "already recorded; skipping");
            tick(i as u64 + 1, &rel_name);
            continue;
        }

        let last_good = manifest.archive_len();
        let outcome = opts.retry.run("append", &sleeper, || {
            // A failed attempt may leave a half-written entry behind.
            ar.truncate(last_good)?;
            ar.append(file, rel)?;
            ar.written_len()
        });
        match outcome {
            Ok(new_len) => {
                manifest.record(&canon, new_len)?;
                appended += 1;
                debug!(file = %rel.display(), len = new_len, "appended");
            }
            Err(e) => {
                warn!(file = %rel.display(), error = %e, "append failed; skipping file");
                ar.truncate(last_good)?;
                failed.push(FailedAppend {
                    path: file.clone(),
                    reason: e.to_string(),
                });
            }
        }
        tick(i as u64 + 1, &rel_name);
    }

    ar.finish()?;
    drop(ar);

    info!(archive = %dest.display(), codec = ?opts.codec, "compressing");
    let compressed = compress_to(dest, &final_path, compressor, opts.level)
        .map_err(|e| compression_failure(&final_path, e))?;

    fs::remove_file(dest)?;
    let file_count = manifest.recorded_count();
    manifest.remove()?;
    info!(
        archive = %final_path.display(),
        files = file_count,
        bytes = compressed,
        failed = failed.len(),
        "pack complete"
    );

    Ok(ArchiveResult {
        final_path,
        file_count,
        appended,
        skipped,
        failed,
    })
}

fn compress_to(src: &Path, dst: &Path, compressor: &dyn Compressor, level: i32) -> Result<u64> {
    let mut input = File::open(src)?;
    let mut output = File::create(dst)?;
    let n = compressor.compress(&mut input, &mut output, level)?;
    output.sync_all()?;
    Ok(n)
}

/// Compression errors are fatal but leave the tar and the manifest on
/// disk, so a re-run skips every file and only redoes this step.
fn compression_failure(path: &Path, e: BalerError) -> BalerError {
    let source = match e {
        BalerError::Io(io) => io,
        other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
    };
    BalerError::CompressionFailure {
        path: path.to_path_buf(),
        source,
    }
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    name.push_str(suffix);
    path.with_file_name(name)
}

fn canonical_set(paths: &[&Path]) -> HashSet<PathBuf> {
    paths.iter().filter_map(|p| p.canonicalize().ok()).collect()
}
