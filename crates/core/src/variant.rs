//! Resolved build variants and the names derived from them.

use std::cmp::Reverse;

use serde::Serialize;

use crate::{config::STYLE_ORDER, settings::FamilyName};

/// One concrete combination of build choices for one style.
///
/// Never mutated after planning; its fields are its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VariantDescriptor {
    pub hinted: bool,
    pub cn: bool,
    pub ligature: bool,
    /// Opinionated defaults; `false` builds the "Normal" family.
    pub opinionated: bool,
    pub nerd_font: bool,
    /// Features enabled on request in addition to the configured map, sorted.
    pub extra_features: Vec<String>,
    pub style: String,
}

impl VariantDescriptor {
    /// Sort key: Latin before CN, plain before NF, hinted first, ligatures
    /// first, opinionated first, then canonical style order.
    #[allow(clippy::type_complexity)]
    pub fn sort_key(
        &self,
    ) -> (bool, bool, Reverse<bool>, Reverse<bool>, Reverse<bool>, usize, &str, &[String]) {
        (
            self.cn,
            self.nerd_font,
            Reverse(self.hinted),
            Reverse(self.ligature),
            Reverse(self.opinionated),
            style_position(&self.style),
            &self.style,
            &self.extra_features,
        )
    }

    /// Family name of this variant without the NF/CN suffix.
    pub fn family(&self, base: &FamilyName) -> FamilyName {
        let mut words = Vec::new();
        if !self.opinionated {
            words.push("Normal");
        }
        if !self.ligature {
            words.push("NL");
        }
        if base.debug {
            words.push("Debug");
        }
        base.with_words(&words)
    }

    /// ` NF`, ` CN` or ` NF CN`.
    pub fn suffix(&self) -> &'static str {
        match (self.nerd_font, self.cn) {
            (false, false) => "",
            (true, false) => " NF",
            (false, true) => " CN",
            (true, true) => " NF CN",
        }
    }

    /// `-NF`, `-CN` or `-NF-CN`.
    pub fn suffix_compact(&self) -> &'static str {
        match (self.nerd_font, self.cn) {
            (false, false) => "",
            (true, false) => "-NF",
            (false, true) => "-CN",
            (true, true) => "-NF-CN",
        }
    }

    /// Family name written into the font, e.g. `Maple Mono NL NF CN`.
    pub fn display_family(&self, base: &FamilyName) -> String {
        format!("{}{}", self.family(base).name, self.suffix())
    }

    /// e.g. `MapleMonoNL-NF-CN-BoldItalic`.
    pub fn postscript_name(&self, base: &FamilyName) -> String {
        format!("{}{}-{}", self.family(base).compact, self.suffix_compact(), self.style)
    }

    pub fn file_name(&self, base: &FamilyName) -> String {
        format!("{}.ttf", self.postscript_name(base))
    }

    /// Output directory and archive name shared by all styles of this variant.
    pub fn group_key(&self, base: &FamilyName) -> String {
        let unhinted = if self.hinted { "" } else { "-unhinted" };
        format!("{}{}{unhinted}", self.family(base).compact, self.suffix_compact())
    }

    /// Short label for logs and reports, e.g. `MapleMono-NF/MapleMono-NF-Bold`.
    pub fn label(&self, base: &FamilyName) -> String {
        format!("{}/{}", self.group_key(base), self.postscript_name(base))
    }
}

/// Position in the canonical style order; unknown styles sort last.
pub fn style_position(style: &str) -> usize {
    STYLE_ORDER.iter().position(|s| *s == style).unwrap_or(STYLE_ORDER.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family() -> FamilyName {
        FamilyName::parse("Maple Mono").unwrap()
    }

    fn variant(style: &str) -> VariantDescriptor {
        VariantDescriptor {
            hinted: true,
            cn: false,
            ligature: true,
            opinionated: true,
            nerd_font: false,
            extra_features: Vec::new(),
            style: style.to_string(),
        }
    }

    #[test]
    fn test_plain_names() {
        let v = variant("Regular");
        assert_eq!(v.display_family(&family()), "Maple Mono");
        assert_eq!(v.postscript_name(&family()), "MapleMono-Regular");
        assert_eq!(v.file_name(&family()), "MapleMono-Regular.ttf");
        assert_eq!(v.group_key(&family()), "MapleMono");
    }

    #[test]
    fn test_full_names() {
        let v = VariantDescriptor {
            hinted: false,
            cn: true,
            ligature: false,
            opinionated: false,
            nerd_font: true,
            ..variant("SemiBoldItalic")
        };
        assert_eq!(v.display_family(&family()), "Maple Mono Normal NL NF CN");
        assert_eq!(v.postscript_name(&family()), "MapleMonoNormalNL-NF-CN-SemiBoldItalic");
        assert_eq!(v.group_key(&family()), "MapleMonoNormalNL-NF-CN-unhinted");
        assert_eq!(
            v.label(&family()),
            "MapleMonoNormalNL-NF-CN-unhinted/MapleMonoNormalNL-NF-CN-SemiBoldItalic"
        );
    }

    #[test]
    fn test_debug_family_ends_with_debug() {
        let family = family().debug();
        let v = VariantDescriptor { ligature: false, nerd_font: true, ..variant("Bold") };
        assert_eq!(v.display_family(&family), "Maple Mono NL Debug NF");
        assert_eq!(v.postscript_name(&family), "MapleMonoNLDebug-NF-Bold");
        assert_eq!(variant("Regular").group_key(&family), "MapleMonoDebug");
    }

    #[test]
    fn test_sort_order() {
        let mut variants = vec![
            VariantDescriptor { cn: true, ..variant("Regular") },
            VariantDescriptor { hinted: false, ..variant("Regular") },
            variant("Bold"),
            VariantDescriptor { nerd_font: true, ..variant("Regular") },
            variant("Thin"),
            VariantDescriptor { ligature: false, ..variant("Regular") },
        ];
        variants.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        let keys: Vec<_> = variants
            .iter()
            .map(|v| (v.cn, v.nerd_font, v.hinted, v.ligature, v.style.as_str()))
            .collect();
        assert_eq!(
            keys,
            [
                (false, false, true, true, "Thin"),
                (false, false, true, true, "Bold"),
                (false, false, true, false, "Regular"),
                (false, false, false, true, "Regular"),
                (false, true, true, true, "Regular"),
                (true, false, true, true, "Regular"),
            ]
        );
    }

    #[test]
    fn test_unknown_style_sorts_last() {
        assert_eq!(style_position("Regular"), 6);
        assert_eq!(style_position("Oblique"), STYLE_ORDER.len());
    }
}
