//! Local file cache keyed by sanitized identifier
//!
//! Cached files live directly under the cache root as `{safe_id}.{ext}`,
//! thumbnails as `thumb_{safe_id}.jpg`. A non-empty file at the expected path
//! is a hit; writers go through a temp file and rename so a reader never sees
//! a partial file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::provider::Representation;

#[derive(Debug, Clone)]
pub struct MediaCache {
    root: PathBuf,
}

impl MediaCache {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, safe_id: &str, ext: &str) -> PathBuf {
        self.root.join(format!("{safe_id}.{ext}"))
    }

    pub fn thumbnail_path(&self, safe_id: &str) -> PathBuf {
        self.root.join(format!("thumb_{safe_id}.jpg"))
    }

    /// Existing non-empty file for the key
    pub fn lookup(&self, safe_id: &str, ext: &str) -> Option<PathBuf> {
        let path = self.path_for(safe_id, ext);
        is_populated(&path).then_some(path)
    }

    /// First existing non-empty file among the candidate extensions
    pub fn lookup_any<'a>(&self, safe_id: &str, exts: impl IntoIterator<Item = &'a str>) -> Option<PathBuf> {
        exts.into_iter().find_map(|ext| self.lookup(safe_id, ext))
    }

    /// Copy a representation to `dest` unless a non-empty file is already there
    pub fn store(&self, representation: &Representation, dest: &Path) -> io::Result<()> {
        if is_populated(dest) {
            log::debug!("cache: keeping existing {}", dest.display());
            return Ok(());
        }
        self.write_atomic(dest, |file| match representation {
            Representation::File(src) => {
                let mut reader = File::open(src)?;
                io::copy(&mut reader, file)?;
                Ok(())
            }
            Representation::Data { bytes, .. } => file.write_all(bytes),
        })
    }

    /// Write through a temp file in the cache root, then rename onto `dest`
    pub fn write_atomic<F>(&self, dest: &Path, write: F) -> io::Result<()>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        write(tmp.as_file_mut())?;
        tmp.as_file().sync_all()?;
        tmp.persist(dest).map_err(|e| e.error)?;
        Ok(())
    }
}

pub(crate) fn is_populated(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
}
