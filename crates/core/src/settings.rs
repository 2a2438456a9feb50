//! Configuration document and its validated model.

use std::{collections::BTreeMap, fs, path::Path};

use font_feature_freezer::{FreezeConfig, FreezePolicy};
use log::warn;
use maple_font_metadata::FontVersion;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    config::{GLYPH_WIDTH, GLYPH_WIDTH_CN_NARROW},
    error::ConfigError,
};

fn default_pool_size() -> usize {
    4
}

fn default_mirror() -> String {
    "github.com".to_string()
}

/// The configuration document as written by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigDocument {
    /// Editor schema hint; ignored.
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    pub family_name: String,
    pub use_hinted: bool,
    pub ligature: bool,
    #[serde(default)]
    pub feature_freeze: BTreeMap<String, FreezePolicy>,
    pub nerd_font: NerdFontOptions,
    pub cn: CnOptions,
    #[serde(default = "default_mirror")]
    pub github_mirror: String,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            schema: None,
            pool_size: default_pool_size(),
            family_name: "Maple Mono".to_string(),
            use_hinted: true,
            ligature: true,
            feature_freeze: BTreeMap::new(),
            nerd_font: NerdFontOptions::default(),
            cn: CnOptions::default(),
            github_mirror: default_mirror(),
        }
    }
}

impl ConfigDocument {
    /// Parse a JSON document.
    pub fn from_json(path: &Path, content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read the document at `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!("Config file not found: {}, using default config", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &content)
    }
}

/// Nerd Font patching options. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NerdFontOptions {
    pub enable: bool,
    /// Nerd Fonts release used when downloading the font patcher.
    pub version: String,
    /// Fixed-width icons.
    pub mono: bool,
    pub use_font_patcher: bool,
    pub glyphs: Vec<String>,
    pub extra_args: Vec<String>,
}

impl Default for NerdFontOptions {
    fn default() -> Self {
        Self {
            enable: true,
            version: "3.2.1".to_string(),
            mono: false,
            use_font_patcher: false,
            glyphs: vec!["--complete".to_string()],
            extra_args: Vec::new(),
        }
    }
}

impl NerdFontOptions {
    /// Whether patching needs the external font patcher rather than the prebuilt glyph base.
    pub fn needs_font_patcher(&self) -> bool {
        self.use_font_patcher || !self.extra_args.is_empty() || self.glyphs != ["--complete"]
    }
}

/// CN glyph merge options. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CnOptions {
    pub enable: bool,
    pub with_nerd_font: bool,
    /// Add CJK code pages and a `meta` table.
    pub fix_meta_table: bool,
    /// Remove the downloaded CN base fonts before the run.
    pub clean_cache: bool,
    /// Narrow full-width glyphs from 1200 to 1000 units.
    pub narrow: bool,
    /// Autohint merged CN fonts.
    pub use_hinted: bool,
    pub use_static_base_font: bool,
}

impl Default for CnOptions {
    fn default() -> Self {
        Self {
            enable: false,
            with_nerd_font: true,
            fix_meta_table: true,
            clean_cache: false,
            narrow: false,
            use_hinted: false,
            use_static_base_font: true,
        }
    }
}

/// A normalised family name: every word capitalised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FamilyName {
    /// Words joined with spaces, e.g. `Maple Mono`.
    pub name: String,
    /// Words joined without spaces, e.g. `MapleMono`.
    pub compact: String,
    /// Variant families end with a `Debug` word.
    pub debug: bool,
}

impl FamilyName {
    pub fn parse(raw: &str) -> Option<Self> {
        let words: Vec<String> = raw.split_whitespace().map(capitalize).collect();
        if words.is_empty() {
            return None;
        }
        Some(Self::from_words(&words))
    }

    fn from_words<S: AsRef<str>>(words: &[S]) -> Self {
        let words: Vec<&str> = words.iter().map(AsRef::as_ref).collect();
        Self {
            name: words.join(" "),
            compact: words.concat(),
            debug: false,
        }
    }

    /// Mark the family as a debug build.
    pub fn debug(self) -> Self {
        Self { debug: true, ..self }
    }

    /// This family with extra words appended, e.g. `Maple Mono Normal NL`.
    pub fn with_words(&self, extra: &[&str]) -> Self {
        let mut words: Vec<&str> = self.name.split(' ').collect();
        words.extend_from_slice(extra);
        Self::from_words(&words)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// The validated configuration of one run. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigModel {
    pub pool_size: usize,
    pub family: FamilyName,
    pub use_hinted: bool,
    pub ligature: bool,
    pub feature_freeze: FreezeConfig,
    pub nerd_font: NerdFontOptions,
    pub cn: CnOptions,
    pub github_mirror: String,
}

impl ConfigModel {
    pub fn from_document(document: ConfigDocument) -> Result<Self, ConfigError> {
        if document.pool_size == 0 {
            return Err(ConfigError::ZeroPoolSize);
        }
        let family =
            FamilyName::parse(&document.family_name).ok_or(ConfigError::EmptyFamilyName)?;
        if document.nerd_font.version.trim().is_empty() {
            return Err(ConfigError::EmptyNerdFontVersion);
        }
        let feature_freeze = FreezeConfig::from_entries(document.feature_freeze)?;

        Ok(Self {
            pool_size: document.pool_size,
            family,
            use_hinted: document.use_hinted,
            ligature: document.ligature,
            feature_freeze,
            nerd_font: document.nerd_font,
            cn: document.cn,
            github_mirror: document.github_mirror,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_document(ConfigDocument::load(path)?)
    }

    /// Advance widths a finished font may contain.
    pub fn allowed_widths(&self, cn: bool) -> Vec<u16> {
        if !cn {
            return vec![0, GLYPH_WIDTH];
        }
        let full_width = if self.cn.narrow { GLYPH_WIDTH_CN_NARROW } else { 2 * GLYPH_WIDTH };
        vec![0, GLYPH_WIDTH, full_width]
    }

    /// The resolved configuration recorded as `build-config.json`.
    ///
    /// The `enable` toggles are left out since they describe the run, not the fonts.
    pub fn build_config_json(&self, version: &FontVersion) -> Value {
        let nerd_font = &self.nerd_font;
        let cn = &self.cn;
        json!({
            "version": version.to_string(),
            "family_name": self.family.name,
            "use_hinted": self.use_hinted,
            "ligature": self.ligature,
            "feature_freeze": self.feature_freeze.to_string_map(),
            "nerd_font": {
                "version": nerd_font.version,
                "mono": nerd_font.mono,
                "use_font_patcher": nerd_font.use_font_patcher,
                "glyphs": nerd_font.glyphs,
                "extra_args": nerd_font.extra_args,
            },
            "cn": {
                "with_nerd_font": cn.with_nerd_font,
                "fix_meta_table": cn.fix_meta_table,
                "clean_cache": cn.clean_cache,
                "narrow": cn.narrow,
                "use_hinted": cn.use_hinted,
                "use_static_base_font": cn.use_static_base_font,
            },
        })
    }
}
