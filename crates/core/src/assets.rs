//! Source font discovery and prebuilt asset downloads.

use std::{
    fs::{self, create_dir_all, remove_dir_all},
    io::{Cursor, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use reqwest::blocking::get;
use zip::ZipArchive;

use crate::{
    config::{
        CN_BASE_TAG, CN_SOURCE_FAMILY, CN_STATIC_DIR, CN_STATIC_ZIP, FONT_PATCHER_ZIP, HINTED_DIR,
        LATIN_DIR, MAPLE_REPO, NERD_FONTS_REPO, NF_BASE_FILENAME, NF_BASE_MONO_FILENAME,
        NF_BASE_TAG, SOURCE_FAMILY, release_url,
    },
    context::RunContext,
    io::{FontFile, glob_fonts, sha256_hex},
    settings::CnOptions,
    variant::style_position,
};

/// Paths of every source font a build reads.
#[derive(Debug, Clone)]
pub struct SourceAssets {
    source_dir: PathBuf,
    mirror: String,
}

impl SourceAssets {
    pub fn new(ctx: &RunContext) -> Self {
        Self {
            source_dir: ctx.source_dir.clone(),
            mirror: ctx.github_mirror.clone(),
        }
    }

    /// Latin base font, pre-hinted or not.
    pub fn latin_font(&self, style: &str, hinted: bool) -> PathBuf {
        let dir = if hinted { HINTED_DIR } else { LATIN_DIR };
        self.source_dir.join(dir).join(format!("{SOURCE_FAMILY}-{style}.ttf"))
    }

    pub fn cn_static_dir(&self) -> PathBuf {
        self.source_dir.join(CN_STATIC_DIR)
    }

    pub fn cn_font(&self, style: &str) -> PathBuf {
        self.cn_static_dir().join(format!("{CN_SOURCE_FAMILY}-{style}.ttf"))
    }

    pub fn nerd_font_base(&self, mono: bool) -> PathBuf {
        let name = if mono { NF_BASE_MONO_FILENAME } else { NF_BASE_FILENAME };
        self.source_dir.join(name)
    }

    /// Styles with an unhinted Latin source, in canonical order.
    pub fn discover_styles(&self) -> Result<Vec<String>> {
        let prefix = format!("{SOURCE_FAMILY}-");
        let mut styles: Vec<String> = glob_fonts(&self.source_dir.join(LATIN_DIR), &format!("{prefix}*.ttf"))?
            .iter()
            .filter_map(|path| path.file_stem()?.to_str()?.strip_prefix(&prefix).map(str::to_string))
            .filter(|style| !style.is_empty() && !style.contains('-'))
            .collect();
        styles.sort_by(|a, b| style_position(a).cmp(&style_position(b)).then_with(|| a.cmp(b)));
        if styles.is_empty() {
            bail!("No source fonts found in {}", self.source_dir.join(LATIN_DIR).display());
        }
        Ok(styles)
    }

    /// Whether a CN base font exists for every style and matches its recorded hash.
    pub fn cn_available(&self, styles: &[String]) -> bool {
        let missing: Vec<&String> = styles.iter().filter(|s| !self.cn_font(s).is_file()).collect();
        if !missing.is_empty() {
            debug!("CN base fonts missing for {missing:?}");
            return false;
        }
        match self.verify_cn_hash() {
            Ok(valid) => valid,
            Err(e) => {
                warn!("Failed to verify CN base fonts: {e:#}");
                false
            }
        }
    }

    /// Compare the CN base directory with its `.sha256` sidecar, if one exists.
    fn verify_cn_hash(&self) -> Result<bool> {
        let dir = self.cn_static_dir();
        let sidecar = dir.with_extension("sha256");
        if !sidecar.is_file() {
            return Ok(true);
        }
        let expected = fs::read_to_string(&sidecar)
            .with_context(|| format!("Failed to read {}", sidecar.display()))?;
        let actual = directory_hash(&dir)?;
        if expected.trim() != actual {
            warn!("CN base fonts in {} do not match {}", dir.display(), sidecar.display());
            return Ok(false);
        }
        Ok(true)
    }

    /// Make CN base fonts available for `styles`, downloading them when missing.
    ///
    /// Returns `false` when they still cannot be found; CN variants are then
    /// built as Latin-only.
    pub fn ensure_cn_static(&self, styles: &[String], options: &CnOptions) -> bool {
        let dir = self.cn_static_dir();
        if options.clean_cache && dir.exists() {
            info!("Cleaning CN base fonts in {}", dir.display());
            if let Err(e) = remove_dir_all(&dir) {
                warn!("Failed to clean {}: {e}", dir.display());
            }
        }
        if !options.use_static_base_font {
            warn!("Only static CN base fonts are supported, using {}", dir.display());
        }
        if self.cn_available(styles) {
            return true;
        }

        let url = release_url(&self.mirror, MAPLE_REPO, CN_BASE_TAG, CN_STATIC_ZIP);
        match download_and_extract(&url, &dir, |name| name.ends_with(".ttf")) {
            Ok(count) => info!("Extracted {count} CN base fonts to {}", dir.display()),
            Err(e) => warn!("Failed to download CN base fonts: {e:#}"),
        }
        self.cn_available(styles)
    }

    /// Path of the prebuilt Nerd Font glyph base, downloaded when missing.
    pub fn ensure_nerd_font_base(&self, mono: bool) -> Result<PathBuf> {
        let path = self.nerd_font_base(mono);
        if path.is_file() {
            return Ok(path);
        }
        let name = path.file_name().and_then(|n| n.to_str()).context("Invalid base font path")?;
        let url = release_url(&self.mirror, MAPLE_REPO, NF_BASE_TAG, name);
        info!("Downloading {name}");
        let bytes = download(&url)?;
        FontFile::new(&path).write_atomic(&bytes)?;
        Ok(path)
    }
}

/// Download and extract the Nerd Fonts font patcher unless `script` already exists.
pub fn ensure_font_patcher(mirror: &str, version: &str, script: &Path, dir: &Path) -> Result<()> {
    if script.is_file() {
        return Ok(());
    }
    let url = release_url(mirror, NERD_FONTS_REPO, &format!("v{version}"), FONT_PATCHER_ZIP);
    info!("Downloading font patcher v{version}");
    let bytes = download(&url)?;
    create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    ZipArchive::new(Cursor::new(bytes.as_slice()))
        .context("Failed to open zip archive")?
        .extract(dir)
        .with_context(|| format!("Failed to extract font patcher to {}", dir.display()))?;
    if !script.is_file() {
        bail!("Font patcher not found at {} after download", script.display());
    }
    Ok(())
}

fn download(url: &str) -> Result<Vec<u8>> {
    let response = get(url).with_context(|| format!("Failed to fetch {url}"))?;
    let status = response.status();
    if !status.is_success() {
        bail!("HTTP {status} for {url}");
    }
    let bytes = response.bytes()?;
    let size_mb = bytes.len() as f64 / 1024.0 / 1024.0;
    debug!("Downloaded {url} ({size_mb:.2} MB)");
    Ok(bytes.to_vec())
}

/// Extract the files selected by `keep` flat into `dir`.
fn download_and_extract(url: &str, dir: &Path, keep: impl Fn(&str) -> bool) -> Result<usize> {
    let bytes = download(url)?;
    let mut archive =
        ZipArchive::new(Cursor::new(bytes.as_slice())).context("Failed to open zip archive")?;
    create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut count = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(name) = entry.enclosed_name().and_then(|p| p.file_name().map(PathBuf::from)) else {
            continue;
        };
        let Some(name) = name.to_str().filter(|n| entry.is_file() && keep(*n)).map(str::to_string)
        else {
            continue;
        };
        let mut buffer = Vec::new();
        entry.read_to_end(&mut buffer)?;
        FontFile::new(dir.join(&name)).write_atomic(&buffer)?;
        count += 1;
    }
    Ok(count)
}

/// SHA-256 over every file in `dir`, in name order: each file contributes its
/// name and the hash of its content.
pub fn directory_hash(dir: &Path) -> Result<String> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    let mut manifest = String::new();
    for path in entries {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let content = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        manifest.push_str(&format!("{name}:{}\n", sha256_hex(&content)));
    }
    Ok(sha256_hex(manifest))
}

#[cfg(test)]
mod tests {
    use maple_font_metadata::FontVersion;
    use tempfile::tempdir;

    use super::*;

    fn assets(source: &Path) -> SourceAssets {
        SourceAssets::new(&RunContext::new(source, "build", "fonts", FontVersion::new(7, "1")))
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, path.to_string_lossy().as_bytes()).unwrap();
    }

    #[test]
    fn test_paths() {
        let assets = assets(Path::new("source"));
        assert_eq!(
            assets.latin_font("Bold", true),
            PathBuf::from("source/ttf-autohint/MapleMono-Bold.ttf")
        );
        assert_eq!(assets.latin_font("Bold", false), PathBuf::from("source/ttf/MapleMono-Bold.ttf"));
        assert_eq!(assets.cn_font("Italic"), PathBuf::from("source/cn/static/MapleMonoCN-Italic.ttf"));
        assert_eq!(assets.nerd_font_base(true), PathBuf::from("source/MapleMono-NF-Base-Mono.ttf"));
    }

    #[test]
    fn test_discover_styles_in_canonical_order() {
        let dir = tempdir().unwrap();
        for style in ["Bold", "Regular", "ThinItalic", "Italic"] {
            touch(&dir.path().join(format!("ttf/MapleMono-{style}.ttf")));
        }
        touch(&dir.path().join("ttf/MapleMono-NF-Base.ttf"));
        let styles = assets(dir.path()).discover_styles().unwrap();
        assert_eq!(styles, ["ThinItalic", "Regular", "Italic", "Bold"]);
    }

    #[test]
    fn test_discover_styles_without_sources_fails() {
        let dir = tempdir().unwrap();
        assert!(assets(dir.path()).discover_styles().is_err());
    }

    #[test]
    fn test_cn_available_checks_every_style_and_hash() {
        let dir = tempdir().unwrap();
        let assets = assets(dir.path());
        let styles = vec!["Regular".to_string(), "Bold".to_string()];
        touch(&assets.cn_font("Regular"));
        assert!(!assets.cn_available(&styles));

        touch(&assets.cn_font("Bold"));
        assert!(assets.cn_available(&styles));

        let sidecar = assets.cn_static_dir().with_extension("sha256");
        fs::write(&sidecar, "0000").unwrap();
        assert!(!assets.cn_available(&styles));

        fs::write(&sidecar, directory_hash(&assets.cn_static_dir()).unwrap()).unwrap();
        assert!(assets.cn_available(&styles));
    }

    #[test]
    fn test_directory_hash_depends_on_content() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.ttf"), b"one").unwrap();
        let first = directory_hash(dir.path()).unwrap();
        assert_eq!(first, directory_hash(dir.path()).unwrap());
        fs::write(dir.path().join("a.ttf"), b"two").unwrap();
        assert_ne!(first, directory_hash(dir.path()).unwrap());
    }
}
