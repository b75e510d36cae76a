use crate::ProgressFn;
use crate::chunking::suffix;
use crate::error::{BalerError, Result};
use crate::manifest::split::SplitManifest;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const IO_BUF: usize = 1 << 20;

#[derive(Debug)]
pub struct ReassemblyResult {
    pub output_path: PathBuf,
    pub bytes: u64,
    pub chunks: usize,
    /// True when a manifest was present and its integrity checks
    /// passed. Without a manifest completeness cannot be proven from
    /// naming alone.
    pub verified: bool,
}

/// Concatenate the chunks in `chunks_dir` back into one file, refusing
/// on any gap in the suffix sequence. With `split_info.json` present
/// the chunk count, total length and source checksum are enforced;
/// without it the merge is best-effort over whatever contiguous set is
/// on disk.
pub fn merge(
    chunks_dir: &Path,
    output: Option<&Path>,
    progress: Option<&ProgressFn<'_>>,
) -> Result<ReassemblyResult> {
    if !chunks_dir.is_dir() {
        return Err(BalerError::MissingInput(chunks_dir.to_path_buf()));
    }

    let manifest = SplitManifest::read_from(chunks_dir)?;
    let (stem, original_name) = match &manifest {
        Some(m) => {
            let original = Path::new(&m.original_file);
            let name = original
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| inferred_stem(chunks_dir));
            let stem = original
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| name.clone());
            (stem, name)
        }
        None => {
            warn!(
                dir = %chunks_dir.display(),
                "no split_info.json; completeness cannot be proven"
            );
            let stem = inferred_stem(chunks_dir);
            (stem.clone(), stem)
        }
    };
    let prefix = format!("{stem}_part_");

    // (ordinal, width, name), sorted by ordinal
    let mut found: Vec<(u64, usize, String)> = Vec::new();
    for entry in fs::read_dir(chunks_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(rest) = name.strip_prefix(&prefix) {
            if let Some((ordinal, width)) = suffix::parse(rest) {
                found.push((ordinal, width, name));
            }
        }
    }
    if found.is_empty() {
        return Err(BalerError::NoChunks(chunks_dir.to_path_buf()));
    }
    found.sort();

    let width = found[0].1;
    if found.iter().any(|(_, w, _)| *w != width) {
        return Err(BalerError::ReassemblyGap {
            dir: chunks_dir.to_path_buf(),
            detail: "mixed suffix widths".to_string(),
        });
    }
    for (i, (ordinal, _, name)) in found.iter().enumerate() {
        if *ordinal != i as u64 {
            return Err(BalerError::ReassemblyGap {
                dir: chunks_dir.to_path_buf(),
                detail: format!(
                    "expected {prefix}{}, found {name}",
                    suffix::render(i as u64, width)
                ),
            });
        }
    }
    if let Some(m) = &manifest {
        if m.chunk_count > 0 && m.chunk_count != found.len() as u64 {
            return Err(BalerError::ReassemblyGap {
                dir: chunks_dir.to_path_buf(),
                detail: format!("manifest lists {} chunks, found {}", m.chunk_count, found.len()),
            });
        }
    }

    let out_path = match output {
        Some(p) => p.to_path_buf(),
        None => chunks_dir
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&original_name),
    };
    let out_parent = match out_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&out_parent)?;

    info!(
        dir = %chunks_dir.display(),
        output = %out_path.display(),
        chunks = found.len(),
        "merging"
    );

    // Concatenate into a temp file and rename on success, so a failed
    // or refused merge never leaves a partial output behind.
    let mut tmp = tempfile::NamedTempFile::new_in(&out_parent)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; IO_BUF];
    let mut bytes = 0u64;
    let total = found.len() as u64;

    for (i, (_, _, name)) in found.iter().enumerate() {
        let mut src = File::open(chunks_dir.join(name))?;
        loop {
            let k = src.read(&mut buf)?;
            if k == 0 {
                break;
            }
            hasher.update(&buf[..k]);
            tmp.write_all(&buf[..k])?;
            bytes += k as u64;
        }
        debug!(chunk = %name, "merged");
        if let Some(p) = progress {
            p(i as u64 + 1, total, name);
        }
    }

    let mut verified = false;
    if let Some(m) = &manifest {
        if m.chunk_count > 0 && bytes != m.total_size_bytes {
            return Err(BalerError::SizeMismatch {
                expected: m.total_size_bytes,
                actual: bytes,
            });
        }
        if let Some(expected) = &m.source_blake3 {
            let actual = hex::encode(hasher.finalize().as_bytes());
            if &actual != expected {
                return Err(BalerError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        verified = m.chunk_count > 0;
    }

    tmp.as_file().sync_all()?;
    tmp.persist(&out_path).map_err(|e| e.error)?;
    info!(output = %out_path.display(), bytes, chunks = found.len(), "merge complete");

    Ok(ReassemblyResult {
        output_path: out_path,
        bytes,
        chunks: found.len(),
        verified,
    })
}

/// `<stem>_splits` directories give their stem back; anything else is
/// taken as-is.
fn inferred_stem(chunks_dir: &Path) -> String {
    let name = chunks_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match name.strip_suffix("_splits") {
        Some(s) => s.to_string(),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::splitter::{SplitOptions, split};

    fn split_fixture(dir: &Path, size: usize, chunk: u64) -> PathBuf {
        let src = dir.join("data.bin");
        let payload: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        fs::write(&src, payload).unwrap();
        let opts = SplitOptions {
            chunk_size_bytes: chunk,
            output_dir: None,
        };
        split(&src, &opts, None).unwrap();
        dir.join("data_splits")
    }

    #[test]
    fn refuses_on_a_gap_in_the_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = split_fixture(dir.path(), 50, 10);
        fs::remove_file(chunks.join("data_part_ac")).unwrap();

        let err = merge(&chunks, None, None).unwrap_err();
        assert!(matches!(err, BalerError::ReassemblyGap { .. }));
    }

    #[test]
    fn refuses_on_missing_tail_when_manifest_present() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = split_fixture(dir.path(), 50, 10);
        // contiguous prefix, but the manifest knows two chunks are gone
        fs::remove_file(chunks.join("data_part_ad")).unwrap();
        fs::remove_file(chunks.join("data_part_ae")).unwrap();

        let err = merge(&chunks, None, None).unwrap_err();
        assert!(matches!(err, BalerError::ReassemblyGap { .. }));
    }

    #[test]
    fn empty_directory_reports_no_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = dir.path().join("data_splits");
        fs::create_dir_all(&chunks).unwrap();

        let err = merge(&chunks, None, None).unwrap_err();
        assert!(matches!(err, BalerError::NoChunks(_)));
    }

    #[test]
    fn missing_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = merge(&dir.path().join("nope_splits"), None, None).unwrap_err();
        assert!(matches!(err, BalerError::MissingInput(_)));
    }

    #[test]
    fn corrupted_chunk_fails_the_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = split_fixture(dir.path(), 50, 10);
        // same length, different bytes
        fs::write(chunks.join("data_part_ab"), vec![0xFFu8; 10]).unwrap();

        let err = merge(&chunks, None, None).unwrap_err();
        assert!(matches!(err, BalerError::ChecksumMismatch { .. }));
    }

    #[test]
    fn truncated_chunk_fails_the_length_check() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = split_fixture(dir.path(), 50, 10);
        fs::write(chunks.join("data_part_ab"), vec![7u8; 4]).unwrap();

        let err = merge(&chunks, None, None).unwrap_err();
        assert!(matches!(err, BalerError::SizeMismatch { .. }));
    }

    #[test]
    fn refused_merges_leave_no_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = split_fixture(dir.path(), 50, 10);
        fs::remove_file(chunks.join("data_part_ac")).unwrap();

        let out = dir.path().join("restored.bin");
        let _ = merge(&chunks, Some(&out), None).unwrap_err();
        assert!(!out.exists());
    }

    #[test]
    fn splits_directory_name_gives_the_stem() {
        assert_eq!(inferred_stem(Path::new("/x/data_splits")), "data");
        assert_eq!(inferred_stem(Path::new("/x/big.tar_splits")), "big.tar");
        assert_eq!(inferred_stem(Path::new("/x/plain")), "plain");
    }
}
