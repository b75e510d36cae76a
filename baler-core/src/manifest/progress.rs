use crate::error::Result;
use crate::manifest::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Serialized resume state for one pack job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressState {
    /// Absolute source paths whose entries are fully in the archive.
    pub uploaded_files: BTreeSet<String>,
    /// Archive length right after the last recorded append. Content past
    /// this offset is not covered by the manifest and gets truncated on
    /// resume.
    #[serde(default)]
    pub archive_len: u64,
}

/// Resume journal for one destination archive, persisted after every
/// append and deleted once the job finalizes. A path is listed iff its
/// entry is durably on disk at or below `archive_len`.
pub struct ProgressManifest {
    path: PathBuf,
    state: ProgressState,
}

impl ProgressManifest {
    /// `.<archive name>.progress.json` next to the archive.
    pub fn path_for(dest: &Path) -> PathBuf {
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "archive".to_string());
        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!(".{name}.progress.json"))
    }

    /// Load the manifest for `dest`, or start empty if none exists.
    /// A present-but-unreadable manifest is an error: silently starting
    /// over would hide whatever corrupted it.
    pub fn load_or_new(dest: &Path) -> Result<Self> {
        let path = Self::path_for(dest);
        let state = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ProgressState::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, state })
    }

    pub fn is_resumed(&self) -> bool {
        !self.state.uploaded_files.is_empty() || self.state.archive_len > 0
    }

    pub fn archive_len(&self) -> u64 {
        self.state.archive_len
    }

    pub fn recorded_count(&self) -> usize {
        self.state.uploaded_files.len()
    }

    pub fn contains(&self, file: &Path) -> bool {
        self.state
            .uploaded_files
            .contains(file.to_string_lossy().as_ref())
    }

    /// Record a durably appended file and persist immediately.
    pub fn record(&mut self, file: &Path, archive_len: u64) -> Result<()> {
        self.state
            .uploaded_files
            .insert(file.to_string_lossy().to_string());
        self.state.archive_len = archive_len;
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.state)?;
        write_atomic(&self.path, &bytes)?;
        debug!(
            manifest = %self.path.display(),
            files = self.state.uploaded_files.len(),
            "progress saved"
        );
        Ok(())
    }

    /// Delete the manifest once the job has fully finished.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
