use std::process::ExitCode;

use clap::Parser;
use env_logger::{Builder, Env};
use log::error;
use maple_fonts_cli::cli::Cli;

fn main() -> ExitCode {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    Cli::parse().command.run().unwrap_or_else(|e| {
        error!("{e:#}");
        ExitCode::FAILURE
    })
}
