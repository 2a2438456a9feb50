use std::{
    ffi::OsString,
    fs::{read, write},
    io,
    path::{Path, PathBuf},
    process::ExitCode,
    result::Result,
};

use clap::Parser;
use font_feature_freezer::{CATALOG, FreezeConfig, FreezePolicy, freeze, report};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Message(String),
    #[error("read: {0}")]
    Read(#[source] io::Error),
    #[error("write: {0}")]
    Write(#[source] io::Error),
    #[error("{0}")]
    Font(#[from] font_feature_freezer::Error),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "font-feature-freezer", version)]
#[command(about = "Freeze optional OpenType features into the default calt feature")]
#[command(after_help = "Examples:\n  \
    font-feature-freezer -e cv01,ss08 -d cv35 MapleMono-Regular.ttf\n  \
    font-feature-freezer --no-liga MapleMono-Regular.ttf MapleMonoNL-Regular.ttf\n  \
    font-feature-freezer -r MapleMono-Regular.ttf")]
struct Cli {
    /// Comma-separated feature tags to move into calt, e.g. 'cv01,ss08'
    #[arg(short, long)]
    enable: Option<String>,
    /// Comma-separated feature tags to remove, e.g. 'cv35'
    #[arg(short, long)]
    disable: Option<String>,
    /// Remove all ligature-bearing rules
    #[arg(long)]
    no_liga: bool,
    /// Report managed features and their lookup counts
    #[arg(short, long)]
    report: bool,
    /// List the feature catalog
    #[arg(short, long)]
    list: bool,
    /// Suppress output except errors
    #[arg(short, long)]
    quiet: bool,
    /// Input .ttf font file
    #[arg(value_name = "INPUT", required_unless_present = "list")]
    input: Option<PathBuf>,
    /// Output font file (default: <input>.frozen.<ext>)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,
}

impl Cli {
    fn run(&self) -> ExitCode {
        self.execute().map_or_else(
            |e| {
                eprintln!("{e}");
                ExitCode::FAILURE
            },
            |_| ExitCode::SUCCESS,
        )
    }

    fn execute(&self) -> CliResult<()> {
        if self.list {
            for entry in CATALOG {
                println!("{:<6}{:?}\t{}", entry.tag.as_str(), entry.kind, entry.description);
            }
            return Ok(());
        }

        let input = self
            .input
            .as_deref()
            .ok_or_else(|| CliError::Message("INPUT is required".into()))?;

        if self.report {
            if self.output.is_some() {
                return Err(CliError::Message("output file is not used with --report".into()));
            }
            let data = read(input).map_err(CliError::Read)?;
            for (tag, count) in report(&data)? {
                println!("{tag}\t{count} lookups");
            }
            return Ok(());
        }

        let config = self.freeze_config()?;
        let output = self.output.clone().unwrap_or_else(|| default_output_path(input));

        let data = read(input).map_err(CliError::Read)?;
        let result = freeze(&data, &config, !self.no_liga)?;
        write(&output, &result.data).map_err(CliError::Write)?;

        if !self.quiet {
            println!(
                "{}: {}",
                input.file_name().unwrap_or_default().to_string_lossy(),
                result.stats
            );
        }
        Ok(())
    }

    fn freeze_config(&self) -> CliResult<FreezeConfig> {
        let entries = [
            (self.disable.as_deref(), FreezePolicy::Disable),
            (self.enable.as_deref(), FreezePolicy::Enable),
        ];
        let pairs: Vec<(String, FreezePolicy)> = entries
            .into_iter()
            .flat_map(|(list, policy)| {
                split_tags(list.unwrap_or_default()).map(move |t| (t.to_owned(), policy))
            })
            .collect();
        if pairs.is_empty() && !self.no_liga {
            return Err(CliError::Message(
                "nothing to do: pass --enable, --disable or --no-liga".into(),
            ));
        }
        Ok(FreezeConfig::from_entries(pairs)?)
    }
}

fn split_tags(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut out = input.to_path_buf();
    let mut name = OsString::new();
    if let Some(stem) = input.file_stem() {
        name.push(stem);
    } else {
        return out.with_extension("frozen");
    }
    name.push(".frozen");
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    out.set_file_name(name);
    out
}

fn main() -> ExitCode {
    Cli::parse().run()
}
