//! Content-addressed cache of finished fonts.

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::debug;

use crate::io::FontFile;

/// Finished fonts stored as `<dir>/<key>.ttf`.
///
/// Shared by all tasks of a run. Entries are written atomically, so a reader
/// sees either a complete font or nothing.
#[derive(Debug, Clone)]
pub struct BuildCache {
    dir: PathBuf,
}

impl BuildCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.ttf"))
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path(key);
        if !path.is_file() {
            return None;
        }
        match FontFile::new(&path).read() {
            Ok(data) => Some(data),
            Err(e) => {
                debug!("Ignoring unreadable cache entry: {e:#}");
                None
            }
        }
    }

    pub fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        FontFile::new(self.path(key)).write_atomic(data)
    }
}
