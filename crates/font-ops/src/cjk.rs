//! Language metadata for fonts carrying CJK glyphs.

use anyhow::{Result, anyhow};
use read_fonts::{TableProvider, types::Tag};
use write_fonts::{
    from_obj::ToOwnedTable,
    tables::{
        meta::{DataMapRecord, Meta, Metadata, ScriptLangTag},
        os2::Os2,
    },
};

use crate::rewrite_font;

/// OS/2 code page bits: Latin 1, JIS/Japan, Chinese Simplified, Chinese Traditional.
pub const CJK_CODE_PAGES: u32 = (1 << 0) | (1 << 17) | (1 << 18) | (1 << 20);

/// Script tags advertised in the `meta` table's `dlng` and `slng` entries.
pub const CJK_LANGUAGES: &[&str] = &["Latn", "Hans", "Hant", "Jpan"];

const META_TAG: Tag = Tag::new(b"meta");
const DLNG: Tag = Tag::new(b"dlng");
const SLNG: Tag = Tag::new(b"slng");

/// Metadata edits applied after merging CJK glyphs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CjkMetadata {
    /// Overwrite `OS/2.xAvgCharWidth`.
    pub avg_char_width: Option<i16>,
    /// Set the CJK code page bits and write a `meta` table.
    pub fix_meta_table: bool,
}

impl CjkMetadata {
    pub fn apply(&self, data: &[u8]) -> Result<Vec<u8>> {
        rewrite_font(data, |font, builder| {
            if let Ok(os2) = font.os2() {
                let mut new_os2: Os2 = os2.to_owned_table();
                if let Some(width) = self.avg_char_width {
                    new_os2.x_avg_char_width = width;
                }
                if self.fix_meta_table {
                    new_os2.ul_code_page_range_1 = Some(CJK_CODE_PAGES);
                    new_os2.ul_code_page_range_2.get_or_insert(0);
                }
                builder.add_table(&new_os2)?;
            }
            if self.fix_meta_table {
                builder.add_table(&build_meta_table(CJK_LANGUAGES, CJK_LANGUAGES)?)?;
            }
            Ok(())
        })
    }
}

/// A `meta` table with `dlng` and `slng` entries.
pub fn build_meta_table(design_languages: &[&str], supported_languages: &[&str]) -> Result<Meta> {
    let tags = |languages: &[&str]| {
        languages
            .iter()
            .map(|lang| {
                ScriptLangTag::new(lang.to_string())
                    .map_err(|_| anyhow!("invalid script tag '{lang}'"))
            })
            .collect::<Result<Vec<_>>>()
            .map(Metadata::ScriptLangTags)
    };
    Ok(Meta::new(vec![
        DataMapRecord::new(DLNG, tags(design_languages)?),
        DataMapRecord::new(SLNG, tags(supported_languages)?),
    ]))
}
