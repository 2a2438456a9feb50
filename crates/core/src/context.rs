//! Run-wide settings shared by the scheduler and every build task.

use std::{
    env,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::available_parallelism,
};

use maple_font_metadata::FontVersion;

use crate::{
    config::{ARCHIVE_DIR, CACHE_DIR, FONT_PATCHER_DIR, SCRATCH_DIR},
    settings::ConfigModel,
    tools::ToolPaths,
};

/// Immutable context of one run, passed explicitly to everything that needs it.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub dist_dir: PathBuf,
    pub pool_size: usize,
    pub github_mirror: String,
    pub version: FontVersion,
    pub tools: ToolPaths,
    /// Reuse cached outputs.
    pub use_cache: bool,
    /// Write one zip archive per variant group.
    pub archive: bool,
    cancel: Arc<AtomicBool>,
}

impl RunContext {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        build_dir: impl Into<PathBuf>,
        dist_dir: impl Into<PathBuf>,
        version: FontVersion,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            build_dir: build_dir.into(),
            dist_dir: dist_dir.into(),
            pool_size: 1,
            github_mirror: "github.com".to_string(),
            version,
            tools: ToolPaths::default(),
            use_cache: false,
            archive: false,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Take the pool size and mirror from a validated configuration.
    pub fn with_config(mut self, config: &ConfigModel) -> Self {
        self.pool_size = effective_pool_size(config.pool_size);
        self.github_mirror = config.github_mirror.clone();
        self
    }

    /// Stop dispatching tasks that have not started yet.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Handle for raising the cancellation flag from elsewhere.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.build_dir.join(CACHE_DIR)
    }

    /// Private working directory for one task.
    pub fn scratch_dir(&self, name: &str) -> PathBuf {
        self.build_dir.join(SCRATCH_DIR).join(name)
    }

    /// Output directory of one variant group.
    pub fn output_dir(&self, group: &str) -> PathBuf {
        self.dist_dir.join(group)
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.dist_dir.join(ARCHIVE_DIR)
    }

    pub fn font_patcher_dir(&self) -> PathBuf {
        self.build_dir.join(FONT_PATCHER_DIR)
    }

    /// The font patcher script, either configured or the downloaded one.
    pub fn font_patcher_script(&self) -> PathBuf {
        self.tools
            .font_patcher
            .clone()
            .unwrap_or_else(|| self.font_patcher_dir().join("font-patcher"))
    }

    pub fn source_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.source_dir.join(relative)
    }
}

/// Pool size after accounting for constrained environments.
///
/// Codespaces and single-CPU machines build one variant at a time.
pub fn effective_pool_size(requested: usize) -> usize {
    let single_cpu = available_parallelism().map(|n| n.get() == 1).unwrap_or(true);
    if env::var_os("CODESPACE_NAME").is_some() || single_cpu {
        1
    } else {
        requested.max(1)
    }
}
