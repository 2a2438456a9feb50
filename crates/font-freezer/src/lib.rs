//! # Font Feature Freezer
//!
//! Freeze optional OpenType features of Maple Mono style fonts into the
//! default contextual-alternates (`calt`) feature, or remove them entirely.
//!
//! Feature membership is modelled as a [`LigatureRuleSet`]: every rule is
//! owned by exactly one [`FeatureTag`]. The [`FeatureFreezeTransformer`]
//! rebuilds that set from a [`FreezeConfig`], and the GSUB adapter writes the
//! result back into the font's feature list.
//!
//! ## Example
//!
//! ```no_run
//! use font_feature_freezer::{FreezeConfig, freeze};
//!
//! let data = std::fs::read("MapleMono-Regular.ttf").unwrap();
//! let config = FreezeConfig::from_str_entries([("cv01", "enable"), ("ss05", "disable")]).unwrap();
//! let frozen = freeze(&data, &config, true).unwrap();
//! std::fs::write("MapleMono-Regular.frozen.ttf", frozen.data).unwrap();
//! ```

mod catalog;
mod error;
mod gsub;
mod policy;
mod rules;
mod transform;

use read_fonts::FontRef;

pub use catalog::{CATALOG, CatalogEntry, FeatureKind, FeatureTag, freezable_tags};
pub use error::{Error, Result};
pub use gsub::{apply_rules, extract_rules, feature_lookup_counts, has_gsub, write_gsub};
pub use policy::{FreezeConfig, FreezePolicy};
pub use rules::{LigatureRule, LigatureRuleSet, RuleBody};
pub use transform::{FeatureFreezeTransformer, FreezeStats, freeze_rules};

/// Output of [`freeze`].
#[derive(Debug, Clone)]
pub struct FreezeResult {
    pub data: Vec<u8>,
    pub stats: FreezeStats,
}

/// Freeze features into font data.
///
/// A font without GSUB has nothing to freeze and is returned unchanged.
pub fn freeze(data: &[u8], config: &FreezeConfig, ligature: bool) -> Result<FreezeResult> {
    let font = FontRef::new(data)?;
    if !has_gsub(&font) {
        return Ok(FreezeResult {
            data: data.to_vec(),
            stats: FreezeStats::default(),
        });
    }
    let rules = extract_rules(&font)?;
    let (rules, stats) = FeatureFreezeTransformer::new(config, ligature).apply(rules);
    let gsub = apply_rules(&font, &rules)?;
    Ok(FreezeResult {
        data: write_gsub(&font, &gsub)?,
        stats,
    })
}

/// Lookup counts of every catalog feature present in the font.
pub fn report(data: &[u8]) -> Result<Vec<(FeatureTag, usize)>> {
    feature_lookup_counts(&FontRef::new(data)?)
}
