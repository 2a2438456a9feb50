//! One build run: discovery, planning, scheduling and packaging.

mod clean;

pub use clean::clean;

use std::{fs::remove_dir_all, time::Instant};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::{
    archive::ArchiveAssembler,
    assets::{SourceAssets, ensure_font_patcher},
    cache::BuildCache,
    config::{BUILD_CONFIG_FILENAME, SCRATCH_DIR},
    context::RunContext,
    io::FontFile,
    planner::{PlanOverrides, VariantPlan, VariantPlanner},
    report::BuildReport,
    scheduler::TaskScheduler,
    settings::ConfigModel,
    task::BuildTask,
    toolkit::{FontToolkit, NerdFontSource},
    tools::{FontPatcher, find_program},
};

const RULE: &str =
    "═══════════════════════════════════════════════════════════════════════════════";

pub fn run_step<T>(
    name: &str,
    step_num: usize,
    total: usize,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    println!("\n[{step_num}/{total}] {name}");
    let start = Instant::now();
    let value = f()?;
    println!("  ✓ {name} ({:.2}s)", start.elapsed().as_secs_f64());
    Ok(value)
}

/// Build every planned variant of `config`.
///
/// Configuration and scheduler errors end the run with an error. Failures of
/// single variants, missing optional assets and skipped archives are kept in
/// the returned report.
pub fn build(
    config: &ConfigModel,
    overrides: &PlanOverrides,
    ctx: &RunContext,
    toolkit: &dyn FontToolkit,
) -> Result<BuildReport> {
    let start = Instant::now();
    let planner = VariantPlanner::new(config, overrides)?;
    let assets = SourceAssets::new(ctx);
    let total = if ctx.archive { 7 } else { 6 };

    println!("{RULE}");
    println!("{} Build Pipeline ({})", config.family.name, ctx.version);
    println!("{RULE}");

    let styles = run_step("Discover source fonts", 1, total, || {
        let styles = assets.discover_styles()?;
        println!("  {} styles: {}", styles.len(), styles.join(", "));
        Ok(styles)
    })?;

    let cn_available = run_step("Prepare CN base fonts", 2, total, || {
        if !planner.wants_cn() {
            println!("  Not requested");
            return Ok(false);
        }
        Ok(assets.ensure_cn_static(&styles, &config.cn))
    })?;

    let nerd_font = run_step("Prepare Nerd Font glyphs", 3, total, || {
        if !planner.nerd_font_enabled() {
            println!("  Not requested");
            return Ok(None);
        }
        match nerd_font_source(config, ctx, &assets) {
            Ok(source) => Ok(Some(source)),
            Err(e) => {
                warn!("Nerd Font glyphs unavailable: {e:#}");
                Ok(None)
            }
        }
    })?;

    let plan = run_step("Plan variants", 4, total, || {
        let plan = planner.plan(&styles, cn_available);
        println!("  {} variants", plan.len());
        Ok(plan)
    })?;

    let tasks: Vec<BuildTask> = plan
        .variants
        .iter()
        .enumerate()
        .map(|(index, variant)| {
            let task = BuildTask::new(index, variant, config, ctx, &assets, nerd_font.as_ref());
            if variant.nerd_font && nerd_font.is_none() {
                task.skip("Nerd Font glyphs unavailable")
            } else {
                task
            }
        })
        .collect();

    let cache = BuildCache::new(ctx.cache_dir());
    let records = run_step(&format!("Build {} variants", tasks.len()), 5, total, || {
        Ok(TaskScheduler::new(ctx).run(&tasks, toolkit, &cache)?)
    })?;
    remove_scratch(ctx);

    let summary = config.feature_freeze.summary(config.ligature);
    let mut report = BuildReport::new(plan.skips, summary);
    records.into_iter().for_each(|record| report.record(record));

    let build_config = ctx.dist_dir.join(BUILD_CONFIG_FILENAME);
    run_step("Write build config", 6, total, || {
        let json = serde_json::to_string_pretty(&config.build_config_json(&ctx.version))
            .context("Failed to serialize build config")?;
        FontFile::new(&build_config).write_atomic(json)
    })?;

    if ctx.archive {
        run_step("Archive variant groups", 7, total, || {
            ArchiveAssembler::new(ctx.archive_dir())
                .with_extra_member(&build_config)
                .assemble(&mut report);
            Ok(())
        })?;
    }

    report.finish(start.elapsed());
    println!("\n{RULE}");
    println!("{report}");
    println!("{RULE}");
    Ok(report)
}

/// Print the resolved configuration and the planned variants without building.
pub fn dry_run(
    config: &ConfigModel,
    overrides: &PlanOverrides,
    ctx: &RunContext,
) -> Result<VariantPlan> {
    let planner = VariantPlanner::new(config, overrides)?;
    let assets = SourceAssets::new(ctx);
    let styles = assets.discover_styles()?;
    let cn_available = planner.wants_cn() && assets.cn_available(&styles);
    let plan = planner.plan(&styles, cn_available);

    let json = serde_json::to_string_pretty(&config.build_config_json(&ctx.version))
        .context("Failed to serialize build config")?;
    println!("{json}");
    println!("\n{} variants (pool size {}):", plan.len(), ctx.pool_size);
    for variant in &plan.variants {
        println!("  {}", variant.label(&config.family));
    }
    for skip in &plan.skips {
        println!("  - {} ({} variants)", skip.reason, skip.affected);
    }
    Ok(plan)
}

/// The font patcher when it is needed and FontForge is installed, the prebuilt glyph base otherwise.
fn nerd_font_source(
    config: &ConfigModel,
    ctx: &RunContext,
    assets: &SourceAssets,
) -> Result<NerdFontSource> {
    let options = &config.nerd_font;
    if options.needs_font_patcher() {
        match find_program(&ctx.tools.fontforge) {
            Some(fontforge) => {
                let script = ctx.font_patcher_script();
                if ctx.tools.font_patcher.is_none() {
                    ensure_font_patcher(
                        &ctx.github_mirror,
                        &options.version,
                        &script,
                        &ctx.font_patcher_dir(),
                    )?;
                }
                info!("Patching Nerd Font glyphs with {}", script.display());
                return Ok(NerdFontSource::Patcher(FontPatcher {
                    fontforge,
                    script,
                    glyphs: options.glyphs.clone(),
                    mono: options.mono,
                    extra_args: options.extra_args.clone(),
                }));
            }
            None => warn!(
                "{} not found, using prebuilt Nerd Font glyphs",
                ctx.tools.fontforge.display()
            ),
        }
    }
    let base = assets.ensure_nerd_font_base(options.mono)?;
    info!("Merging Nerd Font glyphs from {}", base.display());
    Ok(NerdFontSource::Prebuilt(base))
}

fn remove_scratch(ctx: &RunContext) {
    let scratch = ctx.build_dir.join(SCRATCH_DIR);
    if scratch.exists() {
        if let Err(e) = remove_dir_all(&scratch) {
            debug!("Failed to remove {}: {e}", scratch.display());
        }
    }
}
