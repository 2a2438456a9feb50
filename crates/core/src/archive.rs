//! Zip archives of finished variant groups.

use std::{
    collections::BTreeMap,
    fs,
    io::{Cursor, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{info, warn};
use zip::{CompressionMethod, DateTime, ZipWriter, write::SimpleFileOptions};

use crate::{
    io::{FontFile, sha256_hex},
    report::{ArchiveRecord, BuildReport, TaskRecord},
    task::BuiltFont,
};

/// Groups successful outputs and writes one archive per group.
pub struct ArchiveAssembler {
    archive_dir: PathBuf,
    /// Extra member added to every archive, e.g. `build-config.json`.
    extra: Option<PathBuf>,
}

impl ArchiveAssembler {
    pub fn new(archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive_dir: archive_dir.into(),
            extra: None,
        }
    }

    pub fn with_extra_member(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra = Some(path.into());
        self
    }

    /// Successful outputs by group. Groups without any success map to an empty list.
    pub fn group(records: &[TaskRecord]) -> BTreeMap<&str, Vec<&BuiltFont>> {
        let mut groups: BTreeMap<&str, Vec<&BuiltFont>> = BTreeMap::new();
        for record in records {
            let fonts = groups.entry(record.group.as_str()).or_default();
            if let Some(font) = record.built() {
                fonts.push(font);
            }
        }
        groups
    }

    /// Archive every group of `report`, recording archives and omissions in it.
    ///
    /// A group whose archive cannot be written is recorded as an omission too.
    pub fn assemble(&self, report: &mut BuildReport) {
        let dir_ready = match fs::create_dir_all(&self.archive_dir) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to create {}: {e}", self.archive_dir.display());
                false
            }
        };

        let mut archives = Vec::new();
        let mut omissions = Vec::new();
        for (group, fonts) in Self::group(report.records()) {
            if fonts.is_empty() {
                warn!("Skipping archive {group}: no successful outputs");
                omissions.push(group.to_string());
                continue;
            }
            if !dir_ready {
                omissions.push(group.to_string());
                continue;
            }
            match self.write_archive(group, &fonts) {
                Ok(archive) => {
                    info!("Archived {} ({} files)", archive.path.display(), archive.members.len());
                    archives.push(archive);
                }
                Err(e) => {
                    warn!("Failed to archive {group}: {e:#}");
                    omissions.push(group.to_string());
                }
            }
        }

        archives.into_iter().for_each(|a| report.record_archive(a));
        omissions.into_iter().for_each(|g| report.record_omission(g));
    }

    /// Write `<group>.zip` and its `<group>.sha256` sidecar.
    pub fn write_archive(&self, group: &str, fonts: &[&BuiltFont]) -> Result<ArchiveRecord> {
        let mut members: Vec<(String, &Path)> =
            fonts.iter().map(|font| (font.file_name(), font.path.as_path())).collect();
        members.sort_by(|a, b| a.0.cmp(&b.0));
        members.dedup_by(|a, b| a.0 == b.0);
        if let Some(extra) = &self.extra {
            let name = extra
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .context("Invalid archive member path")?;
            members.push((name, extra.as_path()));
        }

        let bytes = zip_members(&members)?;
        let sha256 = sha256_hex(&bytes);
        let path = self.archive_dir.join(format!("{group}.zip"));
        FontFile::new(&path).write_atomic(&bytes)?;
        let sidecar = self.archive_dir.join(format!("{group}.sha256"));
        fs::write(&sidecar, &sha256)
            .with_context(|| format!("Failed to write {}", sidecar.display()))?;

        Ok(ArchiveRecord {
            group: group.to_string(),
            path,
            sha256,
            members: members.into_iter().map(|(name, _)| name).collect(),
        })
    }
}

/// Deflated zip with a fixed timestamp, members in the given order.
fn zip_members(members: &[(String, &Path)]) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, path) in members {
        let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        writer.start_file(name.as_str(), options)?;
        writer.write_all(&data)?;
    }
    Ok(writer.finish()?.into_inner())
}
