//! Per-feature freeze policies.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, catalog::FeatureTag};

/// What to do with the rules owned by one feature tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreezePolicy {
    #[default]
    Ignore,
    Disable,
    Enable,
}

impl FreezePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Disable => "disable",
            Self::Enable => "enable",
        }
    }
}

impl fmt::Display for FreezePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FreezePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(Self::Ignore),
            "disable" => Ok(Self::Disable),
            "enable" => Ok(Self::Enable),
            other => Err(other.to_string()),
        }
    }
}

/// A validated map from catalog tag to policy.
///
/// Tags absent from the map behave as [`FreezePolicy::Ignore`]. Ignore entries
/// are not stored, so two configs with the same effect compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FreezeConfig(BTreeMap<FeatureTag, FreezePolicy>);

impl FreezeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate raw `tag -> policy` entries against the catalog.
    pub fn from_entries<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, FreezePolicy)>,
        K: AsRef<str>,
    {
        let mut config = Self::new();
        for (tag, policy) in entries {
            config.set(resolve_tag(tag.as_ref())?, policy);
        }
        Ok(config)
    }

    /// Validate `tag -> "policy"` string entries, as read from a config document.
    pub fn from_str_entries<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::new();
        for (tag, value) in entries {
            let tag = resolve_tag(tag.as_ref())?;
            let policy = value.as_ref().parse().map_err(|value| Error::InvalidPolicy {
                tag: tag.to_string(),
                value,
            })?;
            config.set(tag, policy);
        }
        Ok(config)
    }

    pub fn set(&mut self, tag: FeatureTag, policy: FreezePolicy) {
        match policy {
            FreezePolicy::Ignore => {
                self.0.remove(&tag);
            }
            _ => {
                self.0.insert(tag, policy);
            }
        }
    }

    pub fn get(&self, tag: FeatureTag) -> FreezePolicy {
        self.0.get(&tag).copied().unwrap_or_default()
    }

    /// Overlay `other` on top of `self`; entries in `other` win.
    pub fn overlay(&self, other: &FreezeConfig) -> FreezeConfig {
        let mut merged = self.clone();
        for (&tag, &policy) in &other.0 {
            merged.set(tag, policy);
        }
        merged
    }

    /// Tags with a non-ignore policy, in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureTag, FreezePolicy)> + '_ {
        self.0.iter().map(|(&t, &p)| (t, p))
    }

    pub fn tags_with(&self, policy: FreezePolicy) -> impl Iterator<Item = FeatureTag> + '_ {
        self.iter().filter(move |&(_, p)| p == policy).map(|(t, _)| t)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact summary embedded in font names: `+tag;` for each enabled tag,
    /// `-tag;` for each disabled tag, and `-calt;` when ligatures are off.
    pub fn summary(&self, ligature: bool) -> String {
        let mut out = String::new();
        for (tag, policy) in self.iter() {
            match policy {
                FreezePolicy::Enable => out.push_str(&format!("+{tag};")),
                FreezePolicy::Disable => out.push_str(&format!("-{tag};")),
                FreezePolicy::Ignore => {}
            }
        }
        if !ligature {
            out.push_str("-calt;");
        }
        out
    }

    /// Entries as plain strings, for serialization into build metadata.
    pub fn to_string_map(&self) -> BTreeMap<String, String> {
        self.iter().map(|(t, p)| (t.to_string(), p.to_string())).collect()
    }
}

fn resolve_tag(raw: &str) -> Result<FeatureTag> {
    let tag = FeatureTag::parse(raw).ok_or_else(|| Error::UnknownFeature(raw.to_string()))?;
    if tag.is_calt() {
        return Err(Error::ReservedFeature(raw.to_string()));
    }
    Ok(tag)
}
