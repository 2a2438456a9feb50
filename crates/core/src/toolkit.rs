//! The font operations a build task needs, behind one narrow interface.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use font_feature_freezer::{FreezeConfig, freeze};
use log::debug;
use maple_font_metadata::{FontVersion, MonospaceSettings};
use maple_font_ops::{CjkMetadata, FontNames, change_glyph_width, verify_advance_widths};

use crate::{
    io::FontFile,
    tools::{self, FontPatcher, ToolPaths},
};

/// Where Nerd Font glyphs come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NerdFontSource {
    /// Merge a prebuilt font carrying only the icon glyphs.
    Prebuilt(PathBuf),
    /// Run the Nerd Fonts patcher.
    Patcher(FontPatcher),
}

/// Font operations over in-memory font binaries.
///
/// `scratch` is a directory private to the calling task.
pub trait FontToolkit: Sync {
    fn freeze(&self, font: &[u8], freeze: &FreezeConfig, ligature: bool) -> Result<Vec<u8>>;

    /// Add the glyphs of `extra` to `base` without glyph ID collisions.
    fn merge(&self, base: &[u8], extra: &[u8], scratch: &Path) -> Result<Vec<u8>>;

    fn fix_cn_metadata(&self, font: &[u8], metadata: &CjkMetadata) -> Result<Vec<u8>>;

    /// Change every glyph advancing `from` units to advance `to` units.
    fn narrow(&self, font: &[u8], from: u16, to: u16) -> Result<Vec<u8>>;

    fn autohint(&self, font: &[u8], scratch: &Path) -> Result<Vec<u8>>;

    fn patch_nerd_font(&self, font: &[u8], source: &NerdFontSource, scratch: &Path)
    -> Result<Vec<u8>>;

    /// Write names and version, and restore fixed-pitch metadata.
    fn rename(&self, font: &[u8], names: &FontNames, version: &FontVersion) -> Result<Vec<u8>>;

    /// Fail unless every advance width is one of `allowed`.
    fn verify_widths(&self, font: &[u8], allowed: &[u16]) -> Result<()>;
}

/// Binary OpenType fonts: edits in-process, merging and patching through external tools.
#[derive(Debug, Clone, Default)]
pub struct OpenTypeToolkit {
    tools: ToolPaths,
}

impl OpenTypeToolkit {
    pub fn new(tools: ToolPaths) -> Self {
        Self { tools }
    }
}

impl FontToolkit for OpenTypeToolkit {
    fn freeze(&self, font: &[u8], config: &FreezeConfig, ligature: bool) -> Result<Vec<u8>> {
        let result = freeze(font, config, ligature).context("Failed to freeze features")?;
        debug!("Froze features: {}", result.stats);
        Ok(result.data)
    }

    fn merge(&self, base: &[u8], extra: &[u8], scratch: &Path) -> Result<Vec<u8>> {
        tools::merge_fonts(&self.tools.merger, base, extra, scratch)
    }

    fn fix_cn_metadata(&self, font: &[u8], metadata: &CjkMetadata) -> Result<Vec<u8>> {
        metadata.apply(font)
    }

    fn narrow(&self, font: &[u8], from: u16, to: u16) -> Result<Vec<u8>> {
        let (data, change) = change_glyph_width(font, from, to)?;
        debug!("Narrowed {} glyphs from {from} to {to}", change.changed);
        Ok(data)
    }

    fn autohint(&self, font: &[u8], scratch: &Path) -> Result<Vec<u8>> {
        tools::autohint(&self.tools.autohinter, font, scratch)
    }

    fn patch_nerd_font(
        &self,
        font: &[u8],
        source: &NerdFontSource,
        scratch: &Path,
    ) -> Result<Vec<u8>> {
        match source {
            NerdFontSource::Prebuilt(path) => {
                let glyphs = FontFile::new(path).read()?;
                self.merge(font, &glyphs, scratch)
            }
            NerdFontSource::Patcher(patcher) => patcher.patch(font, scratch),
        }
    }

    fn rename(&self, font: &[u8], names: &FontNames, version: &FontVersion) -> Result<Vec<u8>> {
        let font = MonospaceSettings::DEFAULT.apply(&version.apply(font)?)?;
        names.apply(&font)
    }

    fn verify_widths(&self, font: &[u8], allowed: &[u16]) -> Result<()> {
        verify_advance_widths(font, allowed)
    }
}
