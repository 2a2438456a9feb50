//! Release versions and fixed-pitch metadata of built fonts.

use std::fmt;

use anyhow::{Context, Result, anyhow};
use maple_font_ops::{map_name_records, rewrite_font};
use read_fonts::TableProvider;
use write_fonts::{
    from_obj::ToOwnedTable,
    tables::{head::Head, os2::Os2, post::Post},
    types::Fixed,
};

/// Name table IDs.
const NAME_ID_VERSION: u16 = 5;

/// Fixed-pitch flags restored on every finished font.
///
/// Glyph patching may clear `post.isFixedPitch` or recompute the average
/// width from the patched glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonospaceSettings {
    /// `OS/2.xAvgCharWidth`, the advance of a half-width glyph.
    pub avg_char_width: i16,
    /// `OS/2.panose.bProportion` (9 is monospaced).
    pub panose_proportion: u8,
}

impl MonospaceSettings {
    pub const DEFAULT: Self = Self {
        avg_char_width: 600,
        panose_proportion: 9,
    };

    pub fn apply(&self, data: &[u8]) -> Result<Vec<u8>> {
        let Self { avg_char_width, panose_proportion } = *self;
        rewrite_font(data, |font, builder| {
            if let Ok(post) = font.post() {
                let mut post: Post = post.to_owned_table();
                post.is_fixed_pitch = 1;
                builder.add_table(&post)?;
            }
            if let Ok(os2) = font.os2() {
                let mut os2: Os2 = os2.to_owned_table();
                os2.panose_10[3] = panose_proportion;
                os2.x_avg_char_width = avg_char_width;
                builder.add_table(&os2)?;
            }
            Ok(())
        })
    }
}

/// A release version such as `v7.1` or `v7.1-dev`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontVersion {
    pub major: u16,
    /// Minor digits as written, read as a decimal fraction: `1` is 0.100.
    pub minor: String,
    /// Pre-release label after the dash, e.g. `dev` or `beta3`.
    pub prerelease: Option<String>,
}

impl FontVersion {
    pub fn new(major: u16, minor: &str) -> Self {
        Self {
            major,
            minor: minor.to_string(),
            prerelease: None,
        }
    }

    /// Parse `[v]MAJOR.MINOR[-PRERELEASE]`.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || anyhow!("Invalid version '{value}'. Expected vMAJOR.MINOR or vMAJOR.MINOR-LABEL.");

        let trimmed = value.strip_prefix('v').unwrap_or(value);
        let (numbers, prerelease) = match trimmed.split_once('-') {
            Some((numbers, label)) if !label.is_empty() => (numbers, Some(label.to_string())),
            Some(_) => return Err(invalid()),
            None => (trimmed, None),
        };
        let (major, minor) = numbers.split_once('.').ok_or_else(invalid)?;
        let major = major.parse().with_context(invalid)?;
        if minor.is_empty() || minor.len() > 3 || !minor.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        Ok(Self {
            major,
            minor: minor.to_string(),
            prerelease,
        })
    }

    /// Minor digits padded on the right to three places.
    fn minor_padded(&self) -> String {
        format!("{:0<3}", self.minor)
    }

    /// NameID 5 value, e.g. `Version 7.100` for `v7.1`.
    pub fn version_string(&self) -> String {
        format!("Version {}.{}", self.major, self.minor_padded())
    }

    /// `head.fontRevision`, e.g. 7.1.
    pub fn revision(&self) -> Fixed {
        let thousandths: u16 = self.minor_padded().parse().unwrap_or_default();
        Fixed::from_f64(self.major as f64 + thousandths as f64 / 1000.0)
    }

    /// `-dev` style suffix, empty for releases.
    pub fn prerelease_suffix(&self) -> String {
        self.prerelease.as_ref().map(|p| format!("-{p}")).unwrap_or_default()
    }

    /// Apply this version to font data.
    ///
    /// Updates `head.font_revision` and name ID 5 (version).
    pub fn apply(&self, data: &[u8]) -> Result<Vec<u8>> {
        let version_string = self.version_string();
        let revision_value = self.revision();

        rewrite_font(data, |font, builder| {
            if let Ok(head) = font.head() {
                let mut new_head: Head = head.to_owned_table();
                new_head.font_revision = revision_value;
                builder.add_table(&new_head)?;
            }

            let new_name = map_name_records(font, |name_id, _| {
                (name_id == NAME_ID_VERSION).then(|| version_string.clone())
            })?;
            builder.add_table(&new_name)?;

            Ok(())
        })
    }
}

impl fmt::Display for FontVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}{}", self.major, self.minor, self.prerelease_suffix())
    }
}
