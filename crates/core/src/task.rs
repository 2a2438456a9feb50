//! One build task: one font file for one variant.

use std::{
    collections::BTreeMap,
    fmt,
    fs::remove_dir_all,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use font_feature_freezer::FreezeConfig;
use log::{debug, warn};
use maple_font_ops::{CjkMetadata, FontNames, StyleName};
use serde::Serialize;

use crate::{
    assets::SourceAssets,
    cache::BuildCache,
    config::{GLYPH_WIDTH, GLYPH_WIDTH_CN_NARROW},
    context::RunContext,
    io::{FontFile, sha256_file, sha256_hex},
    planner::resolved_freeze,
    settings::{CnOptions, ConfigModel, FamilyName, NerdFontOptions},
    toolkit::{FontToolkit, NerdFontSource},
    variant::VariantDescriptor,
};

/// Stages of a build task, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Load,
    FreezeFeatures,
    MergeCn,
    Hint,
    PatchNerdFont,
    Rename,
    VerifyWidths,
    Save,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Load,
        Stage::FreezeFeatures,
        Stage::MergeCn,
        Stage::Hint,
        Stage::PatchNerdFont,
        Stage::Rename,
        Stage::VerifyWidths,
        Stage::Save,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::FreezeFeatures => "freeze-features",
            Stage::MergeCn => "merge-cn",
            Stage::Hint => "hint",
            Stage::PatchNerdFont => "patch-nerd-font",
            Stage::Rename => "rename",
            Stage::VerifyWidths => "verify-widths",
            Stage::Save => "save",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a task failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub stage: Stage,
    /// The full error chain.
    pub cause: String,
}

/// A font produced by a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltFont {
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
    /// Copied from the cache instead of built.
    pub cached: bool,
}

impl BuiltFont {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Source files a task reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInputs {
    pub base: PathBuf,
    pub cn: Option<PathBuf>,
    pub nerd_font: Option<NerdFontSource>,
}

struct LoadedSources {
    base: Vec<u8>,
    cn: Option<Vec<u8>>,
    hashes: Vec<String>,
}

/// Everything that decides the bytes of the output.
#[derive(Serialize)]
struct CacheKey<'a> {
    sources: &'a [String],
    freeze: BTreeMap<String, String>,
    variant: &'a VariantDescriptor,
    family: &'a FamilyName,
    version: String,
    nerd_font: Option<&'a NerdFontOptions>,
    cn: Option<&'a CnOptions>,
}

fn at<T>(stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T, TaskFailure> {
    f().map_err(|e| TaskFailure {
        stage,
        cause: format!("{e:#}"),
    })
}

pub struct BuildTask<'a> {
    pub index: usize,
    pub variant: &'a VariantDescriptor,
    config: &'a ConfigModel,
    ctx: &'a RunContext,
    inputs: TaskInputs,
    freeze: FreezeConfig,
    output: PathBuf,
    skip_reason: Option<String>,
}

impl<'a> BuildTask<'a> {
    pub fn new(
        index: usize,
        variant: &'a VariantDescriptor,
        config: &'a ConfigModel,
        ctx: &'a RunContext,
        assets: &SourceAssets,
        nerd_font: Option<&NerdFontSource>,
    ) -> Self {
        let inputs = TaskInputs {
            base: assets.latin_font(&variant.style, variant.hinted),
            cn: variant.cn.then(|| assets.cn_font(&variant.style)),
            nerd_font: nerd_font.filter(|_| variant.nerd_font).cloned(),
        };
        let output = ctx
            .output_dir(&variant.group_key(&config.family))
            .join(variant.file_name(&config.family));
        Self {
            index,
            variant,
            config,
            ctx,
            inputs,
            freeze: resolved_freeze(config, variant),
            output,
            skip_reason: None,
        }
    }

    /// Mark the task to be skipped instead of run.
    pub fn skip(mut self, reason: impl Into<String>) -> Self {
        self.skip_reason = Some(reason.into());
        self
    }

    pub fn skip_reason(&self) -> Option<&str> {
        self.skip_reason.as_deref()
    }

    pub fn label(&self) -> String {
        self.variant.label(&self.config.family)
    }

    pub fn group(&self) -> String {
        self.variant.group_key(&self.config.family)
    }

    pub fn inputs(&self) -> &TaskInputs {
        &self.inputs
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    pub fn freeze_config(&self) -> &FreezeConfig {
        &self.freeze
    }

    /// NameID 3: version, PostScript name, Nerd Font version, freeze summary and narrow flag.
    pub fn unique_id(&self) -> String {
        let version = &self.ctx.version;
        let postscript = self.variant.postscript_name(&self.config.family);
        let mut suffix = self.freeze.summary(self.variant.ligature);
        if self.variant.cn && self.config.cn.narrow {
            suffix.push_str("Narrow;");
        }
        if self.variant.nerd_font {
            suffix = format!("NF{};{suffix}", self.config.nerd_font.version);
        }
        format!(
            "{}{};SUBF;{postscript};2024;FL830;{suffix}",
            version.version_string(),
            version.prerelease_suffix()
        )
    }

    pub fn names(&self) -> FontNames {
        FontNames {
            family: self.variant.display_family(&self.config.family),
            style: StyleName::parse(&self.variant.style),
            unique_id: self.unique_id(),
            version: self.ctx.version.version_string(),
            postscript: self.variant.postscript_name(&self.config.family),
        }
    }

    fn should_hint(&self) -> bool {
        self.variant.cn && self.variant.hinted && self.config.cn.use_hinted
    }

    /// Run every stage, or copy a cached result when caching is on.
    pub fn run(&self, toolkit: &dyn FontToolkit, cache: &BuildCache) -> Result<BuiltFont, TaskFailure> {
        let sources = at(Stage::Load, || self.load())?;
        let key = at(Stage::Load, || self.cache_key(&sources.hashes))?;

        if self.ctx.use_cache {
            if let Some(data) = cache.get(&key) {
                debug!("{}: cache hit {key}", self.label());
                return at(Stage::Save, || self.save(&data, true));
            }
            debug!("{}: cache miss {key}", self.label());
        }

        let scratch = self.ctx.scratch_dir(&format!("{:03}-{}", self.index, &key[..12]));
        let result = self.run_stages(toolkit, sources, &scratch);
        if scratch.exists() {
            if let Err(e) = remove_dir_all(&scratch) {
                debug!("Failed to remove {}: {e}", scratch.display());
            }
        }
        let font = result?;

        if let Err(e) = cache.put(&key, &font) {
            warn!("{}: failed to write cache entry: {e:#}", self.label());
        }
        at(Stage::Save, || self.save(&font, false))
    }

    fn run_stages(
        &self,
        toolkit: &dyn FontToolkit,
        sources: LoadedSources,
        scratch: &Path,
    ) -> Result<Vec<u8>, TaskFailure> {
        let variant = self.variant;
        let (font, cn) = at(Stage::FreezeFeatures, || {
            let font = toolkit.freeze(&sources.base, &self.freeze, variant.ligature)?;
            let cn = match &sources.cn {
                Some(cn) => Some(toolkit.freeze(cn, &self.freeze, variant.ligature)?),
                None => None,
            };
            Ok((font, cn))
        })?;

        let font = match cn {
            Some(cn) => at(Stage::MergeCn, || self.merge_cn(toolkit, &font, &cn, scratch))?,
            None => font,
        };

        let font = if self.should_hint() {
            at(Stage::Hint, || toolkit.autohint(&font, scratch))?
        } else {
            font
        };

        let font = match (&self.inputs.nerd_font, variant.nerd_font) {
            (Some(source), true) => {
                at(Stage::PatchNerdFont, || toolkit.patch_nerd_font(&font, source, scratch))?
            }
            (None, true) => {
                return Err(TaskFailure {
                    stage: Stage::PatchNerdFont,
                    cause: "no Nerd Font glyph source".to_string(),
                });
            }
            _ => font,
        };

        let font = at(Stage::Rename, || toolkit.rename(&font, &self.names(), &self.ctx.version))?;

        at(Stage::VerifyWidths, || {
            toolkit.verify_widths(&font, &self.config.allowed_widths(variant.cn))
        })?;
        Ok(font)
    }

    fn load(&self) -> Result<LoadedSources> {
        let base = FontFile::new(&self.inputs.base).read()?;
        let cn = match &self.inputs.cn {
            Some(path) => Some(FontFile::new(path).read()?),
            None => None,
        };

        let mut hashes = vec![sha256_hex(&base)];
        if let Some(cn) = &cn {
            hashes.push(sha256_hex(cn));
        }
        match &self.inputs.nerd_font {
            Some(NerdFontSource::Prebuilt(path)) => hashes.push(sha256_file(path)?),
            Some(NerdFontSource::Patcher(patcher)) if patcher.script.is_file() => {
                hashes.push(sha256_file(&patcher.script)?)
            }
            _ => {}
        }
        Ok(LoadedSources { base, cn, hashes })
    }

    fn cache_key(&self, hashes: &[String]) -> Result<String> {
        let key = CacheKey {
            sources: hashes,
            freeze: self.freeze.to_string_map(),
            variant: self.variant,
            family: &self.config.family,
            version: self.ctx.version.to_string(),
            nerd_font: self.variant.nerd_font.then_some(&self.config.nerd_font),
            cn: self.variant.cn.then_some(&self.config.cn),
        };
        let json = serde_json::to_vec(&key).context("Failed to serialize cache key")?;
        Ok(sha256_hex(json))
    }

    /// Merge the frozen CN font, then fix metrics and metadata.
    fn merge_cn(
        &self,
        toolkit: &dyn FontToolkit,
        font: &[u8],
        cn: &[u8],
        scratch: &Path,
    ) -> Result<Vec<u8>> {
        let options = &self.config.cn;
        let merged = toolkit.merge(font, cn, scratch).context("Failed to merge CN glyphs")?;
        let metadata = CjkMetadata {
            avg_char_width: Some(GLYPH_WIDTH as i16),
            fix_meta_table: options.fix_meta_table,
        };
        let merged = toolkit.fix_cn_metadata(&merged, &metadata)?;
        if !options.narrow {
            return Ok(merged);
        }
        toolkit.narrow(&merged, 2 * GLYPH_WIDTH, GLYPH_WIDTH_CN_NARROW)
    }

    fn save(&self, data: &[u8], cached: bool) -> Result<BuiltFont> {
        if data.is_empty() {
            return Err(anyhow!("refusing to write an empty font"));
        }
        FontFile::new(&self.output).write_atomic(data)?;
        Ok(BuiltFont {
            path: self.output.clone(),
            size: data.len() as u64,
            sha256: sha256_hex(data),
            cached,
        })
    }
}

#[cfg(test)]
mod tests {
    use maple_font_metadata::FontVersion;

    use super::*;
    use crate::settings::ConfigDocument;

    fn config(edit: impl FnOnce(&mut ConfigDocument)) -> ConfigModel {
        let mut document = ConfigDocument::default();
        edit(&mut document);
        ConfigModel::from_document(document).unwrap()
    }

    fn context() -> RunContext {
        RunContext::new("source", "build", "fonts", FontVersion::parse("v7.1-dev").unwrap())
    }

    fn variant(cn: bool, nerd_font: bool, ligature: bool) -> VariantDescriptor {
        VariantDescriptor {
            hinted: true,
            cn,
            ligature,
            opinionated: true,
            nerd_font,
            extra_features: Vec::new(),
            style: "Bold".to_string(),
        }
    }

    #[test]
    fn test_stage_names() {
        let names: Vec<_> = Stage::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            [
                "load",
                "freeze-features",
                "merge-cn",
                "hint",
                "patch-nerd-font",
                "rename",
                "verify-widths",
                "save"
            ]
        );
    }

    #[test]
    fn test_inputs_and_output() {
        let config = config(|_| {});
        let ctx = context();
        let assets = SourceAssets::new(&ctx);
        let variant = variant(true, true, true);
        let source = NerdFontSource::Prebuilt(PathBuf::from("source/MapleMono-NF-Base.ttf"));
        let task = BuildTask::new(0, &variant, &config, &ctx, &assets, Some(&source));

        assert_eq!(task.inputs().base, PathBuf::from("source/ttf-autohint/MapleMono-Bold.ttf"));
        assert_eq!(
            task.inputs().cn,
            Some(PathBuf::from("source/cn/static/MapleMonoCN-Bold.ttf"))
        );
        assert_eq!(task.inputs().nerd_font, Some(source));
        assert_eq!(task.output_path(), Path::new("fonts/MapleMono-NF-CN/MapleMono-NF-CN-Bold.ttf"));
    }

    #[test]
    fn test_plain_variant_ignores_nerd_font_source() {
        let config = config(|_| {});
        let ctx = context();
        let assets = SourceAssets::new(&ctx);
        let variant = variant(false, false, true);
        let source = NerdFontSource::Prebuilt(PathBuf::from("base.ttf"));
        let task = BuildTask::new(0, &variant, &config, &ctx, &assets, Some(&source));
        assert_eq!(task.inputs().nerd_font, None);
        assert_eq!(task.inputs().cn, None);
    }

    #[test]
    fn test_unique_id() {
        let config = config(|d| {
            d.cn.narrow = true;
            d.feature_freeze.insert("cv01".into(), font_feature_freezer::FreezePolicy::Enable);
            d.feature_freeze.insert("ss02".into(), font_feature_freezer::FreezePolicy::Disable);
        });
        let ctx = context();
        let assets = SourceAssets::new(&ctx);

        let cn_nf = variant(true, true, true);
        let task = BuildTask::new(0, &cn_nf, &config, &ctx, &assets, None);
        assert_eq!(
            task.unique_id(),
            "Version 7.100-dev;SUBF;MapleMono-NF-CN-Bold;2024;FL830;NF3.2.1;+cv01;-ss02;Narrow;"
        );

        let nl = variant(false, false, false);
        let task = BuildTask::new(0, &nl, &config, &ctx, &assets, None);
        assert_eq!(
            task.unique_id(),
            "Version 7.100-dev;SUBF;MapleMonoNL-Bold;2024;FL830;+cv01;-ss02;-calt;"
        );
    }

    #[test]
    fn test_names_follow_variant() {
        let config = config(|_| {});
        let ctx = context();
        let assets = SourceAssets::new(&ctx);
        let variant = variant(false, true, true);
        let names = BuildTask::new(0, &variant, &config, &ctx, &assets, None).names();
        assert_eq!(names.family, "Maple Mono NF");
        assert_eq!(names.postscript, "MapleMono-NF-Bold");
        assert_eq!(names.version, "Version 7.100");
        assert!(names.style.is_ribbi);
    }

    #[test]
    fn test_cache_key_depends_on_variant_and_sources() {
        let config = config(|_| {});
        let ctx = context();
        let assets = SourceAssets::new(&ctx);
        let a = variant(false, false, true);
        let b = variant(false, false, false);
        let task_a = BuildTask::new(0, &a, &config, &ctx, &assets, None);
        let task_b = BuildTask::new(1, &b, &config, &ctx, &assets, None);
        let hashes = vec!["00".to_string()];

        let key_a = task_a.cache_key(&hashes).unwrap();
        assert_eq!(key_a, task_a.cache_key(&hashes).unwrap());
        assert_eq!(key_a.len(), 64);
        assert_ne!(key_a, task_b.cache_key(&hashes).unwrap());
        assert_ne!(key_a, task_a.cache_key(&["01".to_string()]).unwrap());
    }

    #[test]
    fn test_missing_source_fails_in_load() {
        let config = config(|_| {});
        let ctx = RunContext::new("/nonexistent", "/nonexistent/build", "/nonexistent/fonts", FontVersion::new(7, "1"));
        let assets = SourceAssets::new(&ctx);
        let variant = variant(false, false, true);
        let task = BuildTask::new(0, &variant, &config, &ctx, &assets, None);
        let failure = task
            .run(&crate::toolkit::OpenTypeToolkit::default(), &BuildCache::new(ctx.cache_dir()))
            .unwrap_err();
        assert_eq!(failure.stage, Stage::Load);
        assert!(failure.cause.contains("MapleMono-Bold.ttf"));
    }
}
