//! Error types for configuration, scheduling and build reporting.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::task::Stage;

/// Problems with the configuration document or run parameters.
///
/// Always raised before any font is read.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid feature: {0}")]
    Feature(#[from] font_feature_freezer::Error),

    #[error("pool_size must be at least 1")]
    ZeroPoolSize,

    #[error("family_name must not be empty")]
    EmptyFamilyName,

    #[error("nerd_font.version must not be empty")]
    EmptyNerdFontVersion,

    #[error("Invalid font version: {0}")]
    FontVersion(String),
}

/// Failures of the scheduler itself, as opposed to failures of a task.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("Task {index} finished without a result")]
    MissingResult { index: usize },
}

/// Everything that can go wrong in a run, by how it is handled.
///
/// Only [`BuildError::Configuration`] and [`BuildError::Scheduler`] halt a
/// run. The other kinds are collected into the build report.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("Source asset missing: {0}")]
    SourceAssetMissing(String),

    #[error("{variant}: {stage} failed: {cause}")]
    StageFailure {
        variant: String,
        stage: Stage,
        cause: String,
    },

    #[error("Archive {group} omitted: no successful outputs")]
    AssemblyOmission { group: String },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl BuildError {
    /// Whether this error stops the run instead of being reported at the end.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Scheduler(_))
    }
}
