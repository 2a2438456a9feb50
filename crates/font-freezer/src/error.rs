//! Error types for feature freezing operations.

use std::result;

use read_fonts::ReadError;
use write_fonts::BuilderError;

/// Errors that can occur while resolving or applying a freeze policy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse font: {0}")]
    Parse(#[from] ReadError),

    #[error("no GSUB table in font")]
    NoGsub,

    #[error("failed to build font: {0}")]
    Build(#[from] BuilderError),

    #[error("unknown feature tag '{0}'")]
    UnknownFeature(String),

    #[error("feature '{0}' is the contextual-ligature feature and cannot carry a freeze policy")]
    ReservedFeature(String),

    #[error("invalid freeze policy '{value}' for feature '{tag}' (expected ignore, disable or enable)")]
    InvalidPolicy { tag: String, value: String },
}

pub type Result<T> = result::Result<T, Error>;
