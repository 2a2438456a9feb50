//! Maple Mono build CLI library.

pub mod cli;
pub mod commands;
