//! GSUB (Glyph Substitution) table adapter.
//!
//! Reads feature membership out of a compiled font as a [`LigatureRuleSet`]
//! of lookup references, and writes a rewritten rule set back into the
//! feature list. Lookups themselves are never modified or removed; only the
//! lookup index lists of catalog features change.

use log::debug;
use read_fonts::{FontRef, TableProvider, types::Tag};
use write_fonts::{
    FontBuilder,
    from_obj::ToOwnedTable,
    tables::{
        gsub::Gsub,
        layout::{Feature, FeatureList, FeatureRecord},
    },
};

use crate::{
    Error, Result,
    catalog::FeatureTag,
    rules::{LigatureRule, LigatureRuleSet, RuleBody},
};

const GSUB: Tag = Tag::new(b"GSUB");

/// Whether the font carries a GSUB table at all.
pub fn has_gsub(font: &FontRef) -> bool {
    font.table_data(GSUB).is_some()
}

/// Collect the lookups referenced by every catalog feature in the font.
///
/// A lookup shared by several records with the same tag (one per script)
/// yields a single rule. A font without GSUB has no rules.
pub fn extract_rules(font: &FontRef) -> Result<LigatureRuleSet> {
    if !has_gsub(font) {
        return Ok(LigatureRuleSet::new());
    }
    let gsub = font.gsub()?;
    let feature_list = gsub.feature_list()?;

    let mut rules = LigatureRuleSet::new();
    for record in feature_list.feature_records() {
        let Some(tag) = FeatureTag::from_ot_tag(record.feature_tag()) else {
            continue;
        };
        let feature = record.feature(feature_list.offset_data())?;
        for index in feature.lookup_list_indices() {
            rules.push(LigatureRule::new(tag, RuleBody::Lookup(index.get())));
        }
    }
    Ok(rules)
}

/// Rewrite catalog feature records so they reference exactly the lookups
/// `rules` assigns to them.
///
/// Each record keeps the indices its tag still owns, in their original order.
/// `calt` records additionally receive lookups newly moved into `calt`.
/// Features outside the catalog are copied unchanged.
pub fn apply_rules(font: &FontRef, rules: &LigatureRuleSet) -> Result<Gsub> {
    let gsub = font.gsub().map_err(|_| Error::NoGsub)?;
    let feature_list = gsub.feature_list()?;

    let calt_lookups: Vec<u16> = rules
        .owned_by(FeatureTag::CALT)
        .filter_map(|body| match body {
            RuleBody::Lookup(index) => Some(*index),
            RuleBody::Glyphs { .. } => None,
        })
        .collect();

    let records = feature_list
        .feature_records()
        .iter()
        .map(|record| {
            let mut feature: Feature = record.feature(feature_list.offset_data())?.to_owned_table();
            if let Some(tag) = FeatureTag::from_ot_tag(record.feature_tag()) {
                let before = feature.lookup_list_indices.len();
                let mut indices: Vec<u16> = feature
                    .lookup_list_indices
                    .iter()
                    .copied()
                    .filter(|&i| rules.contains(tag, &RuleBody::Lookup(i)))
                    .collect();
                if tag.is_calt() {
                    for &index in &calt_lookups {
                        if !indices.contains(&index) {
                            indices.push(index);
                        }
                    }
                }
                if indices.len() != before {
                    debug!("{tag}: {before} -> {} lookups", indices.len());
                }
                feature.lookup_list_indices = indices;
            }
            Ok(FeatureRecord::new(record.feature_tag(), feature))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Gsub::new(
        gsub.script_list()?.to_owned_table(),
        FeatureList::new(records),
        gsub.lookup_list()?.to_owned_table(),
    ))
}

/// Replace the GSUB table of `font` and return the serialized font.
pub fn write_gsub(font: &FontRef, gsub: &Gsub) -> Result<Vec<u8>> {
    let mut builder = FontBuilder::new();
    for record in font.table_directory.table_records() {
        if let Some(data) = font.table_data(record.tag()) {
            builder.add_raw(record.tag(), data);
        }
    }
    builder.add_table(gsub)?;
    Ok(builder.build())
}

/// Lookup counts per catalog feature, in catalog order.
pub fn feature_lookup_counts(font: &FontRef) -> Result<Vec<(FeatureTag, usize)>> {
    let rules = extract_rules(font)?;
    let mut counts: Vec<_> = rules
        .owners()
        .into_iter()
        .map(|tag| (tag, rules.owned_by(tag).count()))
        .collect();
    counts.sort_by_key(|(tag, _)| tag.position());
    Ok(counts)
}
