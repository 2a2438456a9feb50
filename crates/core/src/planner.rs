//! Expansion of one configuration into an ordered list of build variants.

use font_feature_freezer::{FeatureTag, FreezeConfig, FreezePolicy};
use log::warn;

use crate::{
    config::{LEAST_STYLES, NORMAL_PRESET},
    error::ConfigError,
    settings::ConfigModel,
    variant::VariantDescriptor,
};

/// How a command-line flag restricts one variant axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AxisSelection {
    /// Use what the configuration asks for.
    #[default]
    Configured,
    Only(bool),
    Both,
}

impl AxisSelection {
    fn resolve(self, configured: &[bool]) -> Vec<bool> {
        match self {
            Self::Configured => configured.to_vec(),
            Self::Only(value) => vec![value],
            Self::Both => vec![false, true],
        }
    }
}

/// Command-line restrictions layered over the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOverrides {
    pub hinted: AxisSelection,
    pub cn: AxisSelection,
    pub ligature: AxisSelection,
    pub opinionated: AxisSelection,
    pub nerd_font: AxisSelection,
    /// Build CN variants with and without Nerd Font glyphs.
    pub cn_both: bool,
    /// Features to enable on top of the configured freeze map.
    pub extra_features: Vec<String>,
    /// Only build Regular, Bold, Italic and BoldItalic.
    pub least_styles: bool,
}

/// A planning decision that dropped or downgraded variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRecord {
    pub reason: String,
    /// Number of variants affected.
    pub affected: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantPlan {
    pub variants: Vec<VariantDescriptor>,
    pub skips: Vec<SkipRecord>,
}

impl VariantPlan {
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

pub struct VariantPlanner<'a> {
    config: &'a ConfigModel,
    overrides: &'a PlanOverrides,
    extra_features: Vec<String>,
}

impl<'a> VariantPlanner<'a> {
    /// Validates the extra feature list against the catalog.
    pub fn new(config: &'a ConfigModel, overrides: &'a PlanOverrides) -> Result<Self, ConfigError> {
        let extra = FreezeConfig::from_entries(
            overrides.extra_features.iter().map(|tag| (tag.as_str(), FreezePolicy::Enable)),
        )?;
        let extra_features = extra.iter().map(|(tag, _)| tag.to_string()).collect();
        Ok(Self {
            config,
            overrides,
            extra_features,
        })
    }

    pub fn nerd_font_enabled(&self) -> bool {
        match self.overrides.nerd_font {
            AxisSelection::Configured => self.config.nerd_font.enable,
            AxisSelection::Only(value) => value,
            AxisSelection::Both => true,
        }
    }

    fn cn_values(&self) -> Vec<bool> {
        let configured: &[bool] = if self.config.cn.enable { &[false, true] } else { &[false] };
        self.overrides.cn.resolve(configured)
    }

    /// Whether any planned variant needs CN base fonts.
    pub fn wants_cn(&self) -> bool {
        self.cn_values().contains(&true)
    }

    fn nerd_font_values(&self, cn: bool) -> Vec<bool> {
        if !self.nerd_font_enabled() {
            return vec![false];
        }
        if cn {
            return if self.overrides.cn_both {
                vec![false, true]
            } else {
                vec![self.config.cn.with_nerd_font]
            };
        }
        match self.overrides.nerd_font {
            AxisSelection::Only(value) => vec![value],
            _ => vec![false, true],
        }
    }

    /// Expand the configuration over `styles`.
    ///
    /// When CN base fonts are unavailable every CN variant is built as its
    /// Latin-only counterpart and a single skip record is kept.
    pub fn plan(&self, styles: &[String], cn_available: bool) -> VariantPlan {
        let overrides = self.overrides;
        let styles: Vec<&String> = styles
            .iter()
            .filter(|s| !overrides.least_styles || LEAST_STYLES.contains(&s.as_str()))
            .collect();

        let mut variants = Vec::new();
        let mut downgraded = 0;
        for hinted in overrides.hinted.resolve(&[self.config.use_hinted]) {
            for cn in self.cn_values() {
                for ligature in overrides.ligature.resolve(&[self.config.ligature]) {
                    for opinionated in overrides.opinionated.resolve(&[true]) {
                        for nerd_font in self.nerd_font_values(cn) {
                            for style in &styles {
                                if cn && !cn_available {
                                    downgraded += 1;
                                }
                                variants.push(VariantDescriptor {
                                    hinted,
                                    cn: cn && cn_available,
                                    ligature,
                                    opinionated,
                                    nerd_font,
                                    extra_features: self.extra_features.clone(),
                                    style: style.to_string(),
                                });
                            }
                        }
                    }
                }
            }
        }

        variants.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        variants.dedup();

        let mut skips = Vec::new();
        if downgraded > 0 {
            warn!("CN base fonts not found, building {downgraded} CN variants as Latin-only");
            skips.push(SkipRecord {
                reason: "CN base fonts not found, CN variants built as Latin-only".to_string(),
                affected: downgraded,
            });
        }
        VariantPlan { variants, skips }
    }
}

/// The freeze map a variant is built with.
///
/// Normal variants enable the normal preset except where the configuration
/// explicitly disables a feature; requested extra features are enabled last.
pub fn resolved_freeze(config: &ConfigModel, variant: &VariantDescriptor) -> FreezeConfig {
    let mut freeze = config.feature_freeze.clone();
    if !variant.opinionated {
        for tag in NORMAL_PRESET.iter().filter_map(|t| FeatureTag::parse(t)) {
            if freeze.get(tag) != FreezePolicy::Disable {
                freeze.set(tag, FreezePolicy::Enable);
            }
        }
    }
    for tag in variant.extra_features.iter().filter_map(|t| FeatureTag::parse(t)) {
        freeze.set(tag, FreezePolicy::Enable);
    }
    freeze
}
