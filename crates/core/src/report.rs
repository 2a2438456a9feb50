//! Aggregated outcome of a build run.

use std::{fmt, path::PathBuf, time::Duration};

use chrono::{DateTime, Local};

use crate::{
    error::BuildError,
    planner::SkipRecord,
    task::{BuiltFont, TaskFailure},
    variant::VariantDescriptor,
};

/// What happened to one planned variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Built(BuiltFont),
    Failed(TaskFailure),
    Skipped(String),
}

/// One planned variant and its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub variant: VariantDescriptor,
    pub label: String,
    /// Output group (directory and archive name).
    pub group: String,
    pub outcome: TaskOutcome,
}

impl TaskRecord {
    pub fn built(&self) -> Option<&BuiltFont> {
        match &self.outcome {
            TaskOutcome::Built(font) => Some(font),
            _ => None,
        }
    }
}

/// A written archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub group: String,
    pub path: PathBuf,
    pub sha256: String,
    /// Member names in archive order.
    pub members: Vec<String>,
}

/// All task outcomes of a run, in plan order.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    records: Vec<TaskRecord>,
    plan_skips: Vec<SkipRecord>,
    archives: Vec<ArchiveRecord>,
    omissions: Vec<String>,
    freeze_summary: String,
    elapsed: Option<Duration>,
    finished_at: Option<DateTime<Local>>,
}

impl BuildReport {
    pub fn new(plan_skips: Vec<SkipRecord>, freeze_summary: impl Into<String>) -> Self {
        Self {
            plan_skips,
            freeze_summary: freeze_summary.into(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, record: TaskRecord) {
        self.records.push(record);
    }

    pub fn record_archive(&mut self, archive: ArchiveRecord) {
        self.archives.push(archive);
    }

    /// A group with no successful outputs was not archived.
    pub fn record_omission(&mut self, group: impl Into<String>) {
        self.omissions.push(group.into());
    }

    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed = Some(elapsed);
        self.finished_at = Some(Local::now());
    }

    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn archives(&self) -> &[ArchiveRecord] {
        &self.archives
    }

    pub fn omissions(&self) -> &[String] {
        &self.omissions
    }

    pub fn plan_skips(&self) -> &[SkipRecord] {
        &self.plan_skips
    }

    pub fn built(&self) -> impl Iterator<Item = (&TaskRecord, &BuiltFont)> {
        self.records.iter().filter_map(|r| r.built().map(|font| (r, font)))
    }

    pub fn built_count(&self) -> usize {
        self.built().count()
    }

    pub fn failed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, TaskOutcome::Failed(_)))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, TaskOutcome::Skipped(_)))
            .count()
    }

    /// A run fails only when nothing was produced.
    pub fn is_success(&self) -> bool {
        self.built_count() > 0
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }

    /// Every non-fatal problem of the run, classified.
    pub fn issues(&self) -> Vec<BuildError> {
        let mut issues: Vec<BuildError> = self
            .plan_skips
            .iter()
            .map(|skip| BuildError::SourceAssetMissing(skip.reason.clone()))
            .collect();
        for record in &self.records {
            match &record.outcome {
                TaskOutcome::Skipped(reason) => {
                    issues.push(BuildError::SourceAssetMissing(format!("{}: {reason}", record.label)))
                }
                TaskOutcome::Failed(failure) => issues.push(BuildError::StageFailure {
                    variant: record.label.clone(),
                    stage: failure.stage,
                    cause: failure.cause.clone(),
                }),
                TaskOutcome::Built(_) => {}
            }
        }
        issues.extend(
            self.omissions
                .iter()
                .map(|group| BuildError::AssemblyOmission { group: group.clone() }),
        );
        issues
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Build Summary")?;
        for (record, font) in self.built() {
            let cached = if font.cached { " (cached)" } else { "" };
            let size_kb = font.size as f64 / 1024.0;
            let checksum = font.sha256.get(..12).unwrap_or(&font.sha256);
            writeln!(f, "  ✓ {} ({size_kb:.1} KB, {checksum}){cached}", record.label)?;
        }
        for skip in &self.plan_skips {
            writeln!(f, "  - {} ({} variants)", skip.reason, skip.affected)?;
        }
        for record in &self.records {
            match &record.outcome {
                TaskOutcome::Skipped(reason) => writeln!(f, "  - {}: skipped, {reason}", record.label)?,
                TaskOutcome::Failed(failure) => writeln!(
                    f,
                    "  ✗ {}: {} failed: {}",
                    record.label, failure.stage, failure.cause
                )?,
                TaskOutcome::Built(_) => {}
            }
        }
        for archive in &self.archives {
            writeln!(f, "  Archive: {} ({} files)", archive.path.display(), archive.members.len())?;
        }
        for group in &self.omissions {
            writeln!(f, "  Archive omitted: {group} (no successful outputs)")?;
        }

        writeln!(f)?;
        writeln!(f, "  Built:   {}", self.built_count())?;
        writeln!(f, "  Skipped: {}", self.skipped_count())?;
        write!(f, "  Failed:  {}", self.failed_count())?;

        let features = if self.freeze_summary.is_empty() { "default config" } else { self.freeze_summary.as_str() };
        if let (Some(elapsed), Some(finished_at)) = (self.elapsed, self.finished_at) {
            write!(
                f,
                "\n\nBuild finished at {}, cost {:.2} s, {features}",
                finished_at.format("%H:%M:%S"),
                elapsed.as_secs_f64()
            )?;
        }
        Ok(())
    }
}
