//! The freeze transformation over a [`LigatureRuleSet`].

use std::fmt;

use log::debug;

use crate::{
    catalog::FeatureTag,
    policy::{FreezeConfig, FreezePolicy},
    rules::{LigatureRule, LigatureRuleSet},
};

/// Counts of what a transformation did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreezeStats {
    /// Rules moved into the contextual-alternates feature.
    pub moved: usize,
    /// Rules deleted, including moved rules already present in `calt`.
    pub removed: usize,
    /// Rules left with their owner.
    pub kept: usize,
}

impl fmt::Display for FreezeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rules moved to calt, {} removed, {} kept",
            self.moved, self.removed, self.kept
        )
    }
}

/// Rewrites rule ownership according to a freeze policy.
///
/// With ligatures off, every ligature-bearing rule is removed and the policy
/// map is not consulted. Otherwise `Enable` moves a tag's rules into `calt`,
/// `Disable` deletes them, and `Ignore` leaves them alone.
#[derive(Debug, Clone, Copy)]
pub struct FeatureFreezeTransformer<'a> {
    policy: &'a FreezeConfig,
    ligature: bool,
}

impl<'a> FeatureFreezeTransformer<'a> {
    pub fn new(policy: &'a FreezeConfig, ligature: bool) -> Self {
        Self { policy, ligature }
    }

    pub fn apply(&self, rules: LigatureRuleSet) -> (LigatureRuleSet, FreezeStats) {
        let mut stats = FreezeStats::default();

        if !self.ligature {
            let kept: LigatureRuleSet = rules
                .into_iter()
                .filter(|rule| {
                    let keep = !rule.owner.is_ligature_bearing();
                    if !keep {
                        stats.removed += 1;
                    }
                    keep
                })
                .collect();
            stats.kept = kept.len();
            debug!("Ligatures disabled: {stats}");
            return (kept, stats);
        }

        let mut result = LigatureRuleSet::new();
        let mut moving = Vec::new();
        for rule in rules {
            match self.policy_for(rule.owner) {
                FreezePolicy::Ignore => {
                    result.push(rule);
                }
                FreezePolicy::Disable => stats.removed += 1,
                FreezePolicy::Enable => moving.push(rule.body),
            }
        }
        stats.kept = result.len();

        for body in moving {
            if result.push(LigatureRule::new(FeatureTag::CALT, body)) {
                stats.moved += 1;
            } else {
                stats.removed += 1;
            }
        }

        debug!("Freeze applied: {stats}");
        (result, stats)
    }

    fn policy_for(&self, tag: FeatureTag) -> FreezePolicy {
        if tag.is_calt() {
            FreezePolicy::Ignore
        } else {
            self.policy.get(tag)
        }
    }
}

/// Apply a freeze policy to a rule set.
pub fn freeze_rules(
    rules: LigatureRuleSet,
    policy: &FreezeConfig,
    ligature: bool,
) -> LigatureRuleSet {
    FeatureFreezeTransformer::new(policy, ligature).apply(rules).0
}
