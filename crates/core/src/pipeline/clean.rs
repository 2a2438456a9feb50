use std::{fs::remove_dir_all, path::Path};

use anyhow::{Context, Result};

/// Remove build outputs. Returns how many of `dirs` existed.
pub fn clean(dirs: &[&Path]) -> Result<usize> {
    let mut removed = 0;
    for dir in dirs {
        if !dir.exists() {
            println!("Skipped {} (not found)", dir.display());
            continue;
        }
        remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
        println!("Removed {}", dir.display());
        removed += 1;
    }
    println!("Cleaned {removed} directories");
    Ok(removed)
}
