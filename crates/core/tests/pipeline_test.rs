//! End-to-end runs over a fake font toolkit.
//!
//! Fonts are JSON documents, so every stage can be observed in the output.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::{Context, Result, bail};
use font_feature_freezer::{
    FeatureTag, FreezeConfig, FreezePolicy, LigatureRule, LigatureRuleSet, RuleBody, freeze_rules,
};
use maple_core::{
    AxisSelection, BuildError, ConfigDocument, ConfigError, ConfigModel, FontToolkit,
    NerdFontSource, PlanOverrides, RunContext, Stage, TaskOutcome, build, dry_run,
};
use maple_font_metadata::FontVersion;
use maple_font_ops::{CjkMetadata, FontNames};
use serde::{Deserialize, Serialize};
use tempfile::{TempDir, tempdir};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct FakeFont {
    style: String,
    /// (owner, from, to)
    rules: Vec<(String, String, String)>,
    widths: Vec<u16>,
    /// Styles of fonts merged into this one, in merge order.
    merged: Vec<String>,
    stages: Vec<String>,
    family: String,
    postscript: String,
    unique_id: String,
}

impl FakeFont {
    fn new(style: &str, widths: &[u16]) -> Self {
        Self {
            style: style.to_string(),
            widths: widths.to_vec(),
            ..Default::default()
        }
    }

    fn with_rules(mut self, rules: &[(&str, &str, &str)]) -> Self {
        self.rules = rules
            .iter()
            .map(|(owner, from, to)| (owner.to_string(), from.to_string(), to.to_string()))
            .collect();
        self
    }

    fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap()
    }

    fn decode(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).context("Not a fake font")
    }

    fn read(path: &Path) -> Self {
        Self::decode(&fs::read(path).unwrap()).unwrap()
    }
}

#[derive(Default)]
struct FakeToolkit {
    /// Styles whose Nerd Font patching fails.
    failing_patch: Vec<&'static str>,
    renames: AtomicUsize,
}

impl FakeToolkit {
    fn failing_patch(styles: &[&'static str]) -> Self {
        Self {
            failing_patch: styles.to_vec(),
            ..Default::default()
        }
    }

    fn edit(data: &[u8], stage: &str, f: impl FnOnce(&mut FakeFont)) -> Result<Vec<u8>> {
        let mut font = FakeFont::decode(data)?;
        f(&mut font);
        font.stages.push(stage.to_string());
        Ok(font.encode())
    }
}

impl FontToolkit for FakeToolkit {
    fn freeze(&self, font: &[u8], freeze: &FreezeConfig, ligature: bool) -> Result<Vec<u8>> {
        let mut font = FakeFont::decode(font)?;
        let rules = font
            .rules
            .iter()
            .map(|(owner, from, to)| -> Result<LigatureRule> {
                let owner = FeatureTag::parse(owner).with_context(|| format!("unknown {owner}"))?;
                Ok(LigatureRule::new(owner, RuleBody::glyphs([from.as_str()], [to.as_str()])))
            })
            .collect::<Result<LigatureRuleSet>>()?;
        font.rules = freeze_rules(rules, freeze, ligature)
            .iter()
            .map(|rule| match &rule.body {
                RuleBody::Glyphs { pattern, replacement } => {
                    (rule.owner.to_string(), pattern.join(" "), replacement.join(" "))
                }
                RuleBody::Lookup(index) => (rule.owner.to_string(), index.to_string(), String::new()),
            })
            .collect();
        font.stages.push("freeze".to_string());
        Ok(font.encode())
    }

    fn merge(&self, base: &[u8], extra: &[u8], _scratch: &Path) -> Result<Vec<u8>> {
        let extra = FakeFont::decode(extra)?;
        Self::edit(base, "merge", |font| {
            font.widths.extend(extra.widths);
            font.merged.push(extra.style);
        })
    }

    fn fix_cn_metadata(&self, font: &[u8], _metadata: &CjkMetadata) -> Result<Vec<u8>> {
        Self::edit(font, "cn-metadata", |_| {})
    }

    fn narrow(&self, font: &[u8], from: u16, to: u16) -> Result<Vec<u8>> {
        Self::edit(font, "narrow", |font| {
            font.widths.iter_mut().filter(|w| **w == from).for_each(|w| *w = to);
        })
    }

    fn autohint(&self, font: &[u8], _scratch: &Path) -> Result<Vec<u8>> {
        Self::edit(font, "hint", |_| {})
    }

    fn patch_nerd_font(
        &self,
        font: &[u8],
        source: &NerdFontSource,
        scratch: &Path,
    ) -> Result<Vec<u8>> {
        let style = FakeFont::decode(font)?.style;
        if self.failing_patch.contains(&style.as_str()) {
            bail!("patcher crashed on {style}");
        }
        match source {
            NerdFontSource::Prebuilt(path) => self.merge(font, &fs::read(path)?, scratch),
            NerdFontSource::Patcher(_) => bail!("no font patcher in tests"),
        }
    }

    fn rename(&self, font: &[u8], names: &FontNames, _version: &FontVersion) -> Result<Vec<u8>> {
        self.renames.fetch_add(1, Ordering::SeqCst);
        Self::edit(font, "rename", |font| {
            font.family = names.family.clone();
            font.postscript = names.postscript.clone();
            font.unique_id = names.unique_id.clone();
        })
    }

    fn verify_widths(&self, font: &[u8], allowed: &[u16]) -> Result<()> {
        let font = FakeFont::decode(font)?;
        match font.widths.iter().find(|w| !allowed.contains(w)) {
            Some(width) => bail!("unexpected advance width {width}"),
            None => Ok(()),
        }
    }
}

const LATIN_RULES: &[(&str, &str, &str)] =
    &[("cv01", "A", "B"), ("ss01", "C", "D"), ("calt", "E", "F"), ("cv02", "a", "a.cv02")];

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Latin sources for `styles` plus the prebuilt Nerd Font glyph base.
    fn new(styles: &[&str]) -> Self {
        let fixture = Self { dir: tempdir().unwrap() };
        for style in styles {
            let font = FakeFont::new(style, &[0, 600, 600]).with_rules(LATIN_RULES);
            fixture.write(&format!("ttf/MapleMono-{style}.ttf"), &font);
            fixture.write(&format!("ttf-autohint/MapleMono-{style}.ttf"), &font);
        }
        fixture.write("MapleMono-NF-Base.ttf", &FakeFont::new("NF-Base", &[600]));
        fixture
    }

    fn with_cn(self, styles: &[&str]) -> Self {
        for style in styles {
            let font = FakeFont::new(&format!("CN-{style}"), &[600, 1200]);
            self.write(&format!("cn/static/MapleMonoCN-{style}.ttf"), &font);
        }
        self
    }

    fn write(&self, relative: &str, font: &FakeFont) {
        let path = self.source().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, font.encode()).unwrap();
    }

    fn source(&self) -> PathBuf {
        self.dir.path().join("source")
    }

    fn dist(&self) -> PathBuf {
        self.dir.path().join("fonts")
    }

    fn context(&self) -> RunContext {
        let mut ctx = RunContext::new(
            self.source(),
            self.dir.path().join("build"),
            self.dist(),
            FontVersion::parse("v7.1-dev").unwrap(),
        );
        ctx.pool_size = 3;
        // Nothing listens here, so downloads fail fast.
        ctx.github_mirror = "127.0.0.1:9".to_string();
        ctx
    }
}

fn config(edit: impl FnOnce(&mut ConfigDocument)) -> ConfigModel {
    let mut document = ConfigDocument::default();
    edit(&mut document);
    ConfigModel::from_document(document).unwrap()
}

fn rules(entries: &[(&str, &str, &str)]) -> Vec<(String, String, String)> {
    FakeFont::default().with_rules(entries).rules
}

#[test]
fn test_builds_every_planned_variant() {
    let fixture = Fixture::new(&["Regular", "Bold"]);
    let config = config(|d| {
        d.feature_freeze.insert("cv01".into(), FreezePolicy::Enable);
        d.feature_freeze.insert("ss01".into(), FreezePolicy::Disable);
    });
    let toolkit = FakeToolkit::default();

    let report = build(&config, &PlanOverrides::default(), &fixture.context(), &toolkit).unwrap();

    assert_eq!(report.records().len(), 4);
    assert_eq!(report.built_count(), 4);
    assert_eq!(report.exit_code(), 0);
    assert!(report.issues().is_empty());

    let plain = FakeFont::read(&fixture.dist().join("MapleMono/MapleMono-Regular.ttf"));
    assert_eq!(
        plain.rules,
        rules(&[("calt", "E", "F"), ("cv02", "a", "a.cv02"), ("calt", "A", "B")])
    );
    assert_eq!(plain.stages, ["freeze", "rename"]);
    assert_eq!(plain.family, "Maple Mono");
    assert_eq!(
        plain.unique_id,
        "Version 7.100-dev;SUBF;MapleMono-Regular;2024;FL830;+cv01;-ss01;"
    );

    let nerd_font = FakeFont::read(&fixture.dist().join("MapleMono-NF/MapleMono-NF-Bold.ttf"));
    assert_eq!(nerd_font.merged, ["NF-Base"]);
    assert_eq!(nerd_font.family, "Maple Mono NF");
    assert_eq!(nerd_font.postscript, "MapleMono-NF-Bold");

    let build_config: serde_json::Value =
        serde_json::from_slice(&fs::read(fixture.dist().join("build-config.json")).unwrap())
            .unwrap();
    assert_eq!(build_config["feature_freeze"]["cv01"], "enable");
    assert!(build_config["cn"].get("enable").is_none());
}

#[test]
fn test_without_ligatures_drops_ligature_rules() {
    let fixture = Fixture::new(&["Regular"]);
    let config = config(|d| {
        d.ligature = false;
        d.nerd_font.enable = false;
        d.feature_freeze.insert("cv01".into(), FreezePolicy::Enable);
    });

    let report =
        build(&config, &PlanOverrides::default(), &fixture.context(), &FakeToolkit::default())
            .unwrap();

    assert_eq!(report.built_count(), 1);
    let font = FakeFont::read(&fixture.dist().join("MapleMonoNL/MapleMonoNL-Regular.ttf"));
    assert_eq!(font.rules, rules(&[("cv02", "a", "a.cv02")]));
    assert!(font.unique_id.ends_with("+cv01;-calt;"));
}

#[test]
fn test_cn_variants_merge_before_nerd_font() {
    let fixture = Fixture::new(&["Regular", "Bold"]).with_cn(&["Regular", "Bold"]);
    let config = config(|d| {
        d.cn.enable = true;
        d.cn.narrow = true;
    });

    let report =
        build(&config, &PlanOverrides::default(), &fixture.context(), &FakeToolkit::default())
            .unwrap();

    // Latin, Latin NF, and CN with Nerd Font glyphs.
    assert_eq!(report.built_count(), 6);
    let font = FakeFont::read(&fixture.dist().join("MapleMono-NF-CN/MapleMono-NF-CN-Bold.ttf"));
    assert_eq!(font.merged, ["CN-Bold", "NF-Base"]);
    assert_eq!(
        font.stages,
        ["freeze", "merge", "cn-metadata", "narrow", "merge", "rename"]
    );
    assert!(font.widths.contains(&1000));
    assert!(!font.widths.contains(&1200));
    assert_eq!(font.family, "Maple Mono NF CN");
}

#[test]
fn test_missing_cn_sources_downgrade_to_latin() {
    let fixture = Fixture::new(&["Regular", "Bold"]);
    let config = config(|d| d.cn.enable = true);
    let overrides = PlanOverrides {
        nerd_font: AxisSelection::Only(false),
        ..Default::default()
    };

    let report = build(&config, &overrides, &fixture.context(), &FakeToolkit::default()).unwrap();

    assert_eq!(report.plan_skips().len(), 1);
    assert_eq!(report.plan_skips()[0].affected, 2);
    assert!(report.records().iter().all(|r| !r.variant.cn));
    assert_eq!(report.built_count(), 2);
    assert_eq!(report.exit_code(), 0);
    assert!(matches!(report.issues()[..], [BuildError::SourceAssetMissing(_)]));
    assert!(!fixture.dist().join("MapleMono-CN").exists());
}

#[test]
fn test_stage_failure_is_isolated() {
    let fixture = Fixture::new(&["Regular", "Bold"]);
    let mut ctx = fixture.context();
    ctx.archive = true;
    let toolkit = FakeToolkit::failing_patch(&["Bold"]);

    let report = build(&config(|_| {}), &PlanOverrides::default(), &ctx, &toolkit).unwrap();

    assert_eq!(report.built_count(), 3);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.exit_code(), 0);
    let failed = report
        .records()
        .iter()
        .find(|r| matches!(r.outcome, TaskOutcome::Failed(_)))
        .unwrap();
    assert_eq!(failed.label, "MapleMono-NF/MapleMono-NF-Bold");
    let TaskOutcome::Failed(failure) = &failed.outcome else { unreachable!() };
    assert_eq!(failure.stage, Stage::PatchNerdFont);
    assert!(failure.cause.contains("patcher crashed on Bold"));

    let members: Vec<&[String]> = report.archives().iter().map(|a| a.members.as_slice()).collect();
    assert_eq!(
        members,
        [
            &["MapleMono-Bold.ttf", "MapleMono-Regular.ttf", "build-config.json"][..],
            &["MapleMono-NF-Regular.ttf", "build-config.json"][..],
        ]
    );
}

#[test]
fn test_group_without_outputs_is_omitted() {
    let fixture = Fixture::new(&["Regular", "Bold"]);
    let mut ctx = fixture.context();
    ctx.archive = true;
    let toolkit = FakeToolkit::failing_patch(&["Regular", "Bold"]);

    let report = build(&config(|_| {}), &PlanOverrides::default(), &ctx, &toolkit).unwrap();

    assert_eq!(report.omissions(), ["MapleMono-NF"]);
    assert_eq!(report.archives().len(), 1);
    assert!(ctx.archive_dir().join("MapleMono.zip").is_file());
    assert!(!ctx.archive_dir().join("MapleMono-NF.zip").exists());
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn test_archives_are_reproducible_across_runs() {
    let fixture = Fixture::new(&["Regular", "Bold"]);
    let mut ctx = fixture.context();
    ctx.archive = true;
    let config = config(|d| d.nerd_font.enable = false);

    let first = build(&config, &PlanOverrides::default(), &ctx, &FakeToolkit::default()).unwrap();
    let second = build(&config, &PlanOverrides::default(), &ctx, &FakeToolkit::default()).unwrap();

    assert_eq!(first.archives()[0].sha256, second.archives()[0].sha256);
    let sidecar = fs::read_to_string(ctx.archive_dir().join("MapleMono.sha256")).unwrap();
    assert_eq!(sidecar, first.archives()[0].sha256);
}

#[test]
fn test_cache_hit_skips_stages() {
    let fixture = Fixture::new(&["Regular", "Bold"]);
    let mut ctx = fixture.context();
    ctx.use_cache = true;
    let config = config(|_| {});
    let toolkit = FakeToolkit::default();

    let first = build(&config, &PlanOverrides::default(), &ctx, &toolkit).unwrap();
    assert!(first.built().all(|(_, font)| !font.cached));
    assert_eq!(toolkit.renames.load(Ordering::SeqCst), 4);

    let second = build(&config, &PlanOverrides::default(), &ctx, &toolkit).unwrap();
    assert!(second.built().all(|(_, font)| font.cached));
    assert_eq!(toolkit.renames.load(Ordering::SeqCst), 4);

    let hashes = |report: &maple_core::BuildReport| -> Vec<String> {
        report.built().map(|(_, font)| font.sha256.clone()).collect()
    };
    assert_eq!(hashes(&first), hashes(&second));
}

#[test]
fn test_every_task_has_one_outcome_in_plan_order() {
    let fixture = Fixture::new(&["Regular", "Bold", "Italic", "BoldItalic"]);
    let ctx = fixture.context();
    let config = config(|_| {});
    let overrides = PlanOverrides {
        hinted: AxisSelection::Both,
        ligature: AxisSelection::Both,
        ..Default::default()
    };
    let toolkit = FakeToolkit::failing_patch(&["Italic"]);

    let plan = dry_run(&config, &overrides, &ctx).unwrap();
    let report = build(&config, &overrides, &ctx, &toolkit).unwrap();

    assert_eq!(plan.len(), 32);
    assert_eq!(report.records().len(), plan.len());
    assert_eq!(
        report.built_count() + report.failed_count() + report.skipped_count(),
        plan.len()
    );
    let planned: Vec<String> = plan.variants.iter().map(|v| v.label(&config.family)).collect();
    let reported: Vec<String> = report.records().iter().map(|r| r.label.clone()).collect();
    assert_eq!(planned, reported);
}

#[test]
fn test_nothing_built_is_failure() {
    let fixture = Fixture::new(&["Regular"]);
    fixture.write(
        "ttf-autohint/MapleMono-Regular.ttf",
        &FakeFont::new("Regular", &[0, 500]),
    );
    let config = config(|d| d.nerd_font.enable = false);

    let report =
        build(&config, &PlanOverrides::default(), &fixture.context(), &FakeToolkit::default())
            .unwrap();

    assert_eq!(report.built_count(), 0);
    assert_eq!(report.exit_code(), 1);
    let TaskOutcome::Failed(failure) = &report.records()[0].outcome else {
        panic!("expected a failure");
    };
    assert_eq!(failure.stage, Stage::VerifyWidths);
}

#[test]
fn test_cancelled_run_skips_tasks() {
    let fixture = Fixture::new(&["Regular", "Bold"]);
    let ctx = fixture.context();
    ctx.cancel();

    let report =
        build(&config(|_| {}), &PlanOverrides::default(), &ctx, &FakeToolkit::default()).unwrap();

    assert_eq!(report.skipped_count(), 4);
    assert!(
        report
            .records()
            .iter()
            .all(|r| r.outcome == TaskOutcome::Skipped("cancelled".to_string()))
    );
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn test_missing_nerd_font_glyphs_skip_nerd_font_variants() {
    let fixture = Fixture::new(&["Regular"]);
    fs::remove_file(fixture.source().join("MapleMono-NF-Base.ttf")).unwrap();

    let report =
        build(&config(|_| {}), &PlanOverrides::default(), &fixture.context(), &FakeToolkit::default())
            .unwrap();

    assert_eq!(report.built_count(), 1);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn test_unknown_extra_feature_fails_before_building() {
    let fixture = Fixture::new(&["Regular"]);
    let overrides = PlanOverrides {
        extra_features: vec!["xx99".to_string()],
        ..Default::default()
    };

    let err = build(&config(|_| {}), &overrides, &fixture.context(), &FakeToolkit::default())
        .unwrap_err();

    assert!(err.downcast_ref::<ConfigError>().is_some());
    assert!(!fixture.dist().exists());
}
