//! Shared font I/O utilities.

use std::{
    fs::{self, create_dir_all, read, remove_file, rename},
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glob::glob;
use sha2::{Digest, Sha256};

/// A font file handle for I/O operations.
#[derive(Debug, Clone)]
pub struct FontFile {
    path: PathBuf,
}

impl FontFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read font data from the file.
    pub fn read(&self) -> Result<Vec<u8>> {
        read(&self.path).with_context(|| format!("Failed to read font: {}", self.path.display()))
    }

    /// Write font data through a temporary sibling and rename it into place.
    ///
    /// Readers never observe a partially written file.
    pub fn write_atomic(&self, data: impl AsRef<[u8]>) -> Result<()> {
        self.ensure_parent_dir()?;
        let temp = temp_path(&self.path);
        let result = fs::write(&temp, data)
            .and_then(|()| rename(&temp, &self.path))
            .with_context(|| format!("Failed to write font: {}", self.path.display()));
        if result.is_err() {
            let _ = remove_file(&temp);
        }
        result
    }

    /// Create parent directory if it doesn't exist.
    pub fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }
        Ok(())
    }
}

impl AsRef<Path> for FontFile {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Unique per thread so concurrent writers of the same target never share a temp file.
fn temp_path(path: &Path) -> PathBuf {
    let thread = format!("{:?}", std::thread::current().id());
    let suffix: String = thread.chars().filter(char::is_ascii_digit).collect();
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.{suffix}.tmp", std::process::id()));
    path.with_file_name(name)
}

/// Find files matching a glob pattern in a directory, sorted by path.
pub fn glob_fonts(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = dir.join(pattern);
    let pattern_str = pattern.to_str().context("Invalid pattern path")?;
    let mut paths: Vec<PathBuf> = glob(pattern_str)
        .with_context(|| format!("Failed to glob pattern: {pattern_str}"))?
        .filter_map(Result::ok)
        .collect();
    paths.sort();
    Ok(paths)
}

/// Lower-case hex SHA-256 of a byte slice.
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    format!("{:x}", hasher.finalize())
}

/// Lower-case hex SHA-256 of a file, streamed.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
