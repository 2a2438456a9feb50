//! Ownership-indexed collection of substitution rules.

use std::fmt;

use crate::catalog::FeatureTag;

/// The substitution a rule performs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleBody {
    /// An authored glyph-sequence pattern and its replacement.
    Glyphs {
        pattern: Vec<String>,
        replacement: Vec<String>,
    },
    /// A compiled GSUB lookup, referenced by its index in the lookup list.
    Lookup(u16),
}

impl RuleBody {
    pub fn glyphs<P, R>(pattern: P, replacement: R) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self::Glyphs {
            pattern: pattern.into_iter().map(Into::into).collect(),
            replacement: replacement.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for RuleBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Glyphs { pattern, replacement } => {
                write!(f, "{} -> {}", pattern.join(" "), replacement.join(" "))
            }
            Self::Lookup(index) => write!(f, "lookup {index}"),
        }
    }
}

/// A rule together with the feature that currently owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LigatureRule {
    pub owner: FeatureTag,
    pub body: RuleBody,
}

impl LigatureRule {
    pub fn new(owner: FeatureTag, body: RuleBody) -> Self {
        Self { owner, body }
    }
}

/// Ordered sequence of rules, each owned by exactly one feature tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LigatureRuleSet {
    rules: Vec<LigatureRule>,
}

impl LigatureRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule unless the same body is already owned by the same tag.
    pub fn push(&mut self, rule: LigatureRule) -> bool {
        if self.contains(rule.owner, &rule.body) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    pub fn contains(&self, owner: FeatureTag, body: &RuleBody) -> bool {
        self.rules.iter().any(|r| r.owner == owner && &r.body == body)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LigatureRule> {
        self.rules.iter()
    }

    /// Rule bodies owned by `tag`, in set order.
    pub fn owned_by(&self, tag: FeatureTag) -> impl Iterator<Item = &RuleBody> {
        self.rules.iter().filter(move |r| r.owner == tag).map(|r| &r.body)
    }

    /// Distinct owners, in order of first appearance.
    pub fn owners(&self) -> Vec<FeatureTag> {
        let mut owners = Vec::new();
        for rule in &self.rules {
            if !owners.contains(&rule.owner) {
                owners.push(rule.owner);
            }
        }
        owners
    }

    pub fn ligature_bearing_count(&self) -> usize {
        self.rules.iter().filter(|r| r.owner.is_ligature_bearing()).count()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<LigatureRule> for LigatureRuleSet {
    fn from_iter<T: IntoIterator<Item = LigatureRule>>(iter: T) -> Self {
        let mut set = Self::new();
        for rule in iter {
            set.push(rule);
        }
        set
    }
}

impl IntoIterator for LigatureRuleSet {
    type Item = LigatureRule;
    type IntoIter = std::vec::IntoIter<LigatureRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}
