//! The fixed catalog of layout features managed by the freezer.

use std::fmt;

use read_fonts::types::Tag;

/// Whether a feature carries ligature rules or single-glyph alternates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// The default contextual-alternates feature that holds always-on ligatures.
    Contextual,
    /// Stylistic sets and variants that add, tweak or normalize ligatures.
    Ligature,
    /// Character variants that swap a single glyph for an alternate.
    Alternate,
}

impl FeatureKind {
    /// Rules of this kind are dropped when ligatures are turned off.
    pub fn is_ligature_bearing(self) -> bool {
        matches!(self, Self::Contextual | Self::Ligature)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureTag(pub &'static str);

impl FeatureTag {
    /// The contextual-alternates feature every enabled rule is moved into.
    pub const CALT: Self = Self("calt");

    /// Look up a tag in the catalog.
    pub fn parse(tag: &str) -> Option<Self> {
        CATALOG.iter().find(|f| f.tag.0 == tag).map(|f| f.tag)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub fn is_calt(&self) -> bool {
        *self == Self::CALT
    }

    pub fn kind(&self) -> FeatureKind {
        CATALOG
            .iter()
            .find(|f| f.tag == *self)
            .map_or(FeatureKind::Alternate, |f| f.kind)
    }

    pub fn is_ligature_bearing(&self) -> bool {
        self.kind().is_ligature_bearing()
    }

    /// Position in the catalog, used as the canonical ordering.
    pub fn position(&self) -> usize {
        CATALOG.iter().position(|f| f.tag == *self).unwrap_or(CATALOG.len())
    }

    pub fn to_ot_tag(&self) -> Tag {
        Tag::new_checked(self.0.as_bytes()).unwrap_or(Tag::new(b"    "))
    }

    pub fn from_ot_tag(tag: Tag) -> Option<Self> {
        Self::parse(&tag.to_string())
    }
}

impl AsRef<str> for FeatureTag {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl fmt::Display for FeatureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub tag: FeatureTag,
    pub kind: FeatureKind,
    pub description: &'static str,
}

const fn entry(tag: &'static str, kind: FeatureKind, description: &'static str) -> CatalogEntry {
    CatalogEntry {
        tag: FeatureTag(tag),
        kind,
        description,
    }
}

use FeatureKind::{Alternate, Contextual, Ligature};

/// Every feature tag the source fonts expose, in canonical order.
pub const CATALOG: &[CatalogEntry] = &[
    entry("calt", Contextual, "Default ligatures"),
    entry("cv01", Ligature, "Normalize special symbols inside ligatures"),
    entry("cv02", Alternate, "Alternative 'a' with top arm"),
    entry("cv03", Alternate, "Alternative 'i' without left bottom bar"),
    entry("cv04", Alternate, "Alternative 'l' with left bottom bar"),
    entry("cv31", Alternate, "Italic 'a' with top arm"),
    entry("cv32", Alternate, "Italic 'f' without bottom tail"),
    entry("cv33", Alternate, "Italic 'i' and 'j' without left bottom bar"),
    entry("cv34", Alternate, "Italic 'k' without center circle"),
    entry("cv35", Alternate, "Italic 'l' without center tail"),
    entry("cv36", Alternate, "Italic 'x' without top and bottom tails"),
    entry("cv37", Alternate, "Italic 'y' with straight tail"),
    entry("cv61", Alternate, "Italic ',' and ';' with straight tail"),
    entry("cv62", Alternate, "Italic '?' with simpler outline"),
    entry("cv96", Alternate, "Full width quotes for CN glyphs"),
    entry("cv97", Alternate, "Full width ellipsis for CN glyphs"),
    entry("cv98", Alternate, "Full width emdash for CN glyphs"),
    entry("cv99", Alternate, "Traditional centered punctuation for CN glyphs"),
    entry("ss01", Ligature, "Broken multiple equals ligatures"),
    entry("ss02", Ligature, "Broken compare and equal ligatures"),
    entry("ss03", Ligature, "Allow arbitrary tags in ligatures"),
    entry("ss04", Ligature, "Break multiple underscores"),
    entry("ss05", Ligature, "Revert thin backslash in escape symbols"),
    entry("ss06", Ligature, "Break connected strokes between italic letters"),
    entry("ss07", Ligature, "Relax the conditions for multiple greaters ligatures"),
    entry("ss08", Ligature, "Double headed arrows and reverse arrows ligatures"),
    entry("ss09", Ligature, "Asciitilde equal as not equal to ligature"),
    entry("zero", Alternate, "Dot style '0'"),
];

/// Tags that may carry a freeze policy (every catalog tag except `calt`).
pub fn freezable_tags() -> impl Iterator<Item = FeatureTag> {
    CATALOG.iter().map(|e| e.tag).filter(|t| !t.is_calt())
}
