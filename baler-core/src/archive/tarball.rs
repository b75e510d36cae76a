use super::ArchiveWriter;
use crate::error::Result;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::path::Path;
use tar::Builder;

/// Plain tar on disk, opened for appending. `resume_len` is the last
/// known-good content length from a prior run; anything past it (a
/// half-written entry, a stale end-of-archive marker) is cut off before
/// new entries go in. `None` starts the archive from scratch.
pub struct TarAppender {
    builder: Builder<File>,
}

impl TarAppender {
    pub fn open(path: &Path, resume_len: Option<u64>) -> Result<Self> {
        let mut f = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        let len = resume_len.unwrap_or(0);
        f.set_len(len)?;
        f.seek(SeekFrom::Start(len))?;
        let mut builder = Builder::new(f);
        builder.follow_symlinks(false);
        Ok(Self { builder })
    }
}

impl ArchiveWriter for TarAppender {
    /// Entry content is synced before returning, so a recorded append
    /// survives a crash.
    fn append(&mut self, src: &Path, rel: &Path) -> Result<()> {
        self.builder.append_path_with_name(src, rel)?;
        self.builder.get_mut().sync_data()?;
        Ok(())
    }

    fn written_len(&mut self) -> Result<u64> {
        Ok(self.builder.get_mut().metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> Result<()> {
        let f = self.builder.get_mut();
        f.set_len(len)?;
        f.seek(SeekFrom::Start(len))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.builder.finish()?;
        self.builder.get_mut().sync_all()?;
        Ok(())
    }
}
