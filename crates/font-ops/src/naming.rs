//! Family and style naming.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::{rewrite_font, set_name_records};

/// Styles that fit the four-member family model and never get typographic names.
const RIBBI_STYLES: &[&str] = &["Regular", "Bold", "Italic", "BoldItalic"];

/// A style name split the way the name table wants it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleName {
    /// Compact form used in file and PostScript names, e.g. `SemiBoldItalic`.
    pub compact: String,
    /// Suffix appended to the family for NameID 1, e.g. ` SemiBold`.
    pub family_suffix: String,
    /// NameID 2 value.
    pub subfamily: String,
    /// Human-readable style, e.g. `SemiBold Italic`; NameID 17 value.
    pub typographic: String,
    pub is_ribbi: bool,
    pub is_italic: bool,
}

impl StyleName {
    pub fn parse(compact: &str) -> Self {
        let is_italic = compact.ends_with("Italic");
        let typographic = match compact.strip_suffix("Italic") {
            Some(weight) if is_italic && !weight.is_empty() => format!("{weight} Italic"),
            _ => compact.to_string(),
        };

        if RIBBI_STYLES.contains(&compact) {
            Self {
                compact: compact.to_string(),
                family_suffix: String::new(),
                subfamily: typographic.clone(),
                typographic,
                is_ribbi: true,
                is_italic,
            }
        } else {
            Self {
                compact: compact.to_string(),
                family_suffix: format!(" {}", compact.replace("Italic", "")),
                subfamily: if is_italic { "Italic" } else { "Regular" }.to_string(),
                typographic,
                is_ribbi: false,
                is_italic,
            }
        }
    }
}

/// Every name record a variant rewrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontNames {
    /// Family without the style, e.g. `Maple Mono NF`.
    pub family: String,
    pub style: StyleName,
    pub unique_id: String,
    pub version: String,
    pub postscript: String,
}

impl FontNames {
    /// Name ID to value; `None` removes the record.
    pub fn records(&self) -> BTreeMap<u16, Option<String>> {
        let style = &self.style;
        let mut records = BTreeMap::new();
        records.insert(1, Some(format!("{}{}", self.family, style.family_suffix)));
        records.insert(2, Some(style.subfamily.clone()));
        records.insert(3, Some(self.unique_id.clone()));
        records.insert(4, Some(format!("{} {}", self.family, style.typographic)));
        records.insert(5, Some(self.version.clone()));
        records.insert(6, Some(self.postscript.clone()));
        if style.is_ribbi {
            records.insert(16, None);
            records.insert(17, None);
        } else {
            records.insert(16, Some(self.family.clone()));
            records.insert(17, Some(style.typographic.clone()));
        }
        records
    }

    pub fn apply(&self, data: &[u8]) -> Result<Vec<u8>> {
        let records = self.records();
        rewrite_font(data, |font, builder| {
            builder.add_table(&set_name_records(font, &records)?)?;
            Ok(())
        })
    }
}
