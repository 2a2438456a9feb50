//! Configuration constants for Maple Mono variant builds.

/// Default configuration document.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Default source, intermediate and output directories.
pub const DEFAULT_SOURCE_DIR: &str = "source";
pub const DEFAULT_BUILD_DIR: &str = "build";
pub const DEFAULT_DIST_DIR: &str = "fonts";

/// Release version stamped into every font.
pub const FONT_VERSION: &str = "v7.1-dev";

/// File name prefix of the Latin source fonts, e.g. `MapleMono-Bold.ttf`.
pub const SOURCE_FAMILY: &str = "MapleMono";

/// Unhinted Latin sources, relative to the source directory.
pub const LATIN_DIR: &str = "ttf";

/// Pre-hinted Latin sources, relative to the source directory.
pub const HINTED_DIR: &str = "ttf-autohint";

/// Static CN base fonts, relative to the source directory.
pub const CN_STATIC_DIR: &str = "cn/static";

/// File name prefix of the CN base fonts, e.g. `MapleMonoCN-Bold.ttf`.
pub const CN_SOURCE_FAMILY: &str = "MapleMonoCN";

/// Prebuilt Nerd Font glyph bases, relative to the source directory.
pub const NF_BASE_FILENAME: &str = "MapleMono-NF-Base.ttf";
pub const NF_BASE_MONO_FILENAME: &str = "MapleMono-NF-Base-Mono.ttf";

/// Repository hosting the CN and Nerd Font base releases.
pub const MAPLE_REPO: &str = "subframe7536/maple-font";

/// Release tags of the prebuilt base assets.
pub const CN_BASE_TAG: &str = "cn-base";
pub const NF_BASE_TAG: &str = "nf-base";

/// Archive of static CN base fonts attached to the `cn-base` release.
pub const CN_STATIC_ZIP: &str = "cn-base-static.zip";

/// Repository hosting the Nerd Fonts font patcher.
pub const NERD_FONTS_REPO: &str = "ryanoasis/nerd-fonts";

/// Font patcher release asset.
pub const FONT_PATCHER_ZIP: &str = "FontPatcher.zip";

/// Directory the font patcher is extracted into, relative to the build directory.
pub const FONT_PATCHER_DIR: &str = "FontPatcher";

/// Width of a half-width glyph.
pub const GLYPH_WIDTH: u16 = 600;

/// Width CN full-width glyphs are narrowed to.
pub const GLYPH_WIDTH_CN_NARROW: u16 = 1000;

/// Styles kept by `--least-styles`; also the four-member family styles.
pub const LEAST_STYLES: &[&str] = &["Regular", "Bold", "Italic", "BoldItalic"];

/// Canonical style order, lightest first, upright before italic.
pub const STYLE_ORDER: &[&str] = &[
    "Thin",
    "ThinItalic",
    "ExtraLight",
    "ExtraLightItalic",
    "Light",
    "LightItalic",
    "Regular",
    "Italic",
    "Medium",
    "MediumItalic",
    "SemiBold",
    "SemiBoldItalic",
    "Bold",
    "BoldItalic",
    "ExtraBold",
    "ExtraBoldItalic",
];

/// Features enabled in normal (non-opinionated) variants.
pub const NORMAL_PRESET: &[&str] = &[
    "cv01", "cv02", "cv33", "cv34", "cv35", "cv36", "cv61", "cv62", "ss05", "ss06", "ss07",
    "ss08", "zero",
];

/// Resolved configuration written next to the fonts and into every archive.
pub const BUILD_CONFIG_FILENAME: &str = "build-config.json";

/// Archive directory, relative to the output directory.
pub const ARCHIVE_DIR: &str = "archive";

/// Build cache, relative to the build directory.
pub const CACHE_DIR: &str = "cache";

/// Per-task scratch space, relative to the build directory.
pub const SCRATCH_DIR: &str = "tmp";

/// Release asset download URL on a GitHub-compatible mirror.
pub fn release_url(mirror: &str, repo: &str, tag: &str, asset: &str) -> String {
    format!("https://{mirror}/{repo}/releases/download/{tag}/{asset}")
}
