//! CLI definitions and command dispatch.

use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::{Parser, Subcommand};
use maple_core::{
    clean,
    config::{DEFAULT_BUILD_DIR, DEFAULT_CONFIG_FILE, DEFAULT_DIST_DIR},
};

use crate::commands::{BuildArgs, build, features};

#[derive(Parser)]
#[command(name = "maple-fonts", version)]
#[command(about = "Build Maple Mono font variants")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build every variant the configuration asks for
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },
    /// Remove the build and output directories
    Clean {
        #[arg(long, default_value = DEFAULT_BUILD_DIR)]
        build_dir: PathBuf,
        #[arg(long, default_value = DEFAULT_DIST_DIR)]
        dist_dir: PathBuf,
    },
    /// List the freezable features and their configured policies
    Features {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

impl Commands {
    pub fn run(self) -> Result<ExitCode> {
        match self {
            Commands::Build { args } => build(&args),
            Commands::Clean { build_dir, dist_dir } => {
                clean(&[&build_dir, &dist_dir])?;
                Ok(ExitCode::SUCCESS)
            }
            Commands::Features { config } => {
                features(&config)?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
