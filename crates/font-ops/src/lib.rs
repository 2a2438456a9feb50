//! Generic font table manipulation utilities.

mod cjk;
mod naming;
mod widths;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use read_fonts::{FontRef, TableProvider, types::NameId};
use write_fonts::{
    FontBuilder,
    tables::name::{Name, NameRecord},
};

pub use cjk::{CJK_CODE_PAGES, CJK_LANGUAGES, CjkMetadata, build_meta_table};
pub use naming::{FontNames, StyleName};
pub use widths::{GlyphWidthChange, advance_widths, change_glyph_width, verify_advance_widths};

/// Windows platform, Unicode BMP encoding, English (US).
const WINDOWS_ENGLISH: (u16, u16, u16) = (3, 1, 0x409);

/// Rewrite font data by applying a transformation function.
///
/// Copies all tables from the source font, then calls `f` to modify or add tables.
/// The function receives a reference to the source font and a mutable builder
/// that already contains all original tables.
pub fn rewrite_font(
    data: &[u8],
    f: impl FnOnce(&FontRef, &mut FontBuilder) -> Result<()>,
) -> Result<Vec<u8>> {
    let font = FontRef::new(data).context("Failed to parse font")?;
    let mut builder = FontBuilder::new();

    for record in font.table_directory.table_records() {
        let tag = record.tag();
        if let Some(table_data) = font.table_data(tag) {
            builder.add_raw(tag, table_data);
        }
    }

    f(&font, &mut builder)?;
    Ok(builder.build())
}

/// Map name table records using a transformation function.
///
/// The mapper receives `(name_id, current_string)` and returns:
/// - `Some(new_string)` to replace the record's string
/// - `None` to keep the current string unchanged
pub fn map_name_records(
    font: &FontRef,
    mut mapper: impl FnMut(u16, &str) -> Option<String>,
) -> Result<Name> {
    let name = font.name()?;
    let mut new_records = Vec::new();

    for record in name.name_record() {
        let name_id = record.name_id().to_u16();
        let current = match record.string(name.string_data()) {
            Ok(s) => s.chars().collect::<String>(),
            Err(_) => continue,
        };

        let new_string = mapper(name_id, &current).unwrap_or(current);

        new_records.push(NameRecord::new(
            record.platform_id(),
            record.encoding_id(),
            record.language_id(),
            NameId::new(name_id),
            new_string.into(),
        ));
    }

    Ok(Name::new(new_records))
}

/// Set or remove name records by ID.
///
/// `Some(value)` replaces every existing record with that ID, adding a
/// Windows English record when the font has none. `None` removes the ID.
/// IDs absent from `edits` are copied unchanged.
pub fn set_name_records(font: &FontRef, edits: &BTreeMap<u16, Option<String>>) -> Result<Name> {
    let mut records: Vec<NameRecord> = Vec::new();
    let mut present = Vec::new();

    if let Ok(name) = font.name() {
        for record in name.name_record() {
            let name_id = record.name_id().to_u16();
            let value = match edits.get(&name_id) {
                Some(None) => continue,
                Some(Some(value)) => value.clone(),
                None => match record.string(name.string_data()) {
                    Ok(s) => s.chars().collect(),
                    Err(_) => continue,
                },
            };
            present.push(name_id);
            records.push(NameRecord::new(
                record.platform_id(),
                record.encoding_id(),
                record.language_id(),
                NameId::new(name_id),
                value.into(),
            ));
        }
    }

    let (platform, encoding, language) = WINDOWS_ENGLISH;
    for (&name_id, value) in edits {
        if let Some(value) = value
            && !present.contains(&name_id)
        {
            records.push(NameRecord::new(
                platform,
                encoding,
                language,
                NameId::new(name_id),
                value.clone().into(),
            ));
        }
    }

    records.sort_by_key(|r| (r.platform_id, r.encoding_id, r.language_id, r.name_id));
    Ok(Name::new(records))
}
