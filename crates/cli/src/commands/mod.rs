//! CLI command implementations.

mod build;
mod features;

pub use build::{BuildArgs, build};
pub use features::features;
