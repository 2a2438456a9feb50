//! External font tools run as child processes.

use std::{
    env,
    ffi::{OsStr, OsString},
    fs::{create_dir_all, write},
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result, bail};
use log::debug;

use crate::io::{FontFile, glob_fonts};

/// Programs used for the stages that are not done in-process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// fontTools glyph merger.
    pub merger: PathBuf,
    pub autohinter: PathBuf,
    pub fontforge: PathBuf,
    /// Nerd Fonts `font-patcher` script; downloaded into the build directory when unset.
    pub font_patcher: Option<PathBuf>,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            merger: PathBuf::from("pyftmerge"),
            autohinter: PathBuf::from("ttfautohint"),
            fontforge: PathBuf::from("fontforge"),
            font_patcher: None,
        }
    }
}

/// Run `program`, failing with its stderr when it exits unsuccessfully.
pub fn run_tool<I, S>(program: &Path, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    debug!("Running {}", program.display());
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("Failed to run {}", program.display()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{} exited with {}: {}", program.display(), output.status, stderr.trim());
    }
    Ok(())
}

/// Resolve `program` the way the shell would: paths as given, bare names through `PATH`.
pub fn find_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }
    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|candidate| candidate.is_file())
    })
}

/// Merge the glyphs of `extra` into `base` with the external merger.
pub fn merge_fonts(merger: &Path, base: &[u8], extra: &[u8], scratch: &Path) -> Result<Vec<u8>> {
    create_dir_all(scratch)?;
    let base_path = scratch.join("merge-base.ttf");
    let extra_path = scratch.join("merge-extra.ttf");
    let output = scratch.join("merged.ttf");
    write(&base_path, base)?;
    write(&extra_path, extra)?;

    let mut output_arg = OsString::from("--output-file=");
    output_arg.push(&output);
    run_tool(merger, [output_arg, base_path.into(), extra_path.into()])?;
    FontFile::new(output).read()
}

/// Autohint a font with `ttfautohint`.
pub fn autohint(autohinter: &Path, font: &[u8], scratch: &Path) -> Result<Vec<u8>> {
    create_dir_all(scratch)?;
    let input = scratch.join("unhinted.ttf");
    let output = scratch.join("hinted.ttf");
    write(&input, font)?;
    run_tool(autohinter, [&input, &output])?;
    FontFile::new(output).read()
}

/// The Nerd Fonts patcher, run through FontForge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontPatcher {
    pub fontforge: PathBuf,
    pub script: PathBuf,
    /// Glyph selection, e.g. `--complete`.
    pub glyphs: Vec<String>,
    pub mono: bool,
    pub extra_args: Vec<String>,
}

impl FontPatcher {
    /// Arguments passed to FontForge.
    pub fn args(&self, input: &Path, output_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            self.script.clone().into(),
            "-l".into(),
            "--careful".into(),
            "--outputdir".into(),
            output_dir.into(),
        ];
        args.extend(self.glyphs.iter().map(OsString::from));
        if self.mono {
            args.push("--mono".into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push(input.into());
        args
    }

    pub fn patch(&self, font: &[u8], scratch: &Path) -> Result<Vec<u8>> {
        let input = scratch.join("unpatched.ttf");
        let output_dir = scratch.join("patched");
        create_dir_all(&output_dir)?;
        write(&input, font)?;

        run_tool(&self.fontforge, self.args(&input, &output_dir))?;

        match glob_fonts(&output_dir, "*.ttf")?.as_slice() {
            [patched] => FontFile::new(patched).read(),
            [] => bail!("Font patcher produced no font in {}", output_dir.display()),
            many => bail!("Font patcher produced {} fonts, expected one", many.len()),
        }
    }
}
