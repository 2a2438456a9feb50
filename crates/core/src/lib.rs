//! Maple Core - configuration-driven variant builds of Maple Mono.

pub mod archive;
pub mod assets;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod planner;
pub mod report;
pub mod scheduler;
pub mod settings;
pub mod task;
pub mod toolkit;
pub mod tools;
pub mod variant;

pub use archive::ArchiveAssembler;
pub use context::RunContext;
pub use error::{BuildError, ConfigError, SchedulerError};
pub use pipeline::{build, clean, dry_run};
pub use planner::{AxisSelection, PlanOverrides, SkipRecord, VariantPlan, VariantPlanner};
pub use report::{BuildReport, TaskOutcome, TaskRecord};
pub use scheduler::TaskScheduler;
pub use settings::{ConfigDocument, ConfigModel};
pub use task::{BuildTask, BuiltFont, Stage, TaskFailure};
pub use toolkit::{FontToolkit, NerdFontSource, OpenTypeToolkit};
pub use variant::VariantDescriptor;

pub use font_feature_freezer::{FeatureTag, FreezeConfig, FreezePolicy};
pub use maple_font_metadata::FontVersion;
