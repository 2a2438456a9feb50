use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use log::{info, warn};
use maple_core::{
    AxisSelection, ConfigDocument, ConfigError, ConfigModel, OpenTypeToolkit, PlanOverrides,
    RunContext,
    config::{DEFAULT_BUILD_DIR, DEFAULT_CONFIG_FILE, DEFAULT_DIST_DIR, DEFAULT_SOURCE_DIR, FONT_VERSION},
    dry_run,
    tools::ToolPaths,
};
use maple_font_metadata::FontVersion;

#[derive(Debug, Clone, clap::Args)]
pub struct BuildArgs {
    /// Configuration file; built-in defaults are used when it does not exist
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
    #[arg(long, default_value = DEFAULT_SOURCE_DIR)]
    pub source_dir: PathBuf,
    #[arg(long, default_value = DEFAULT_BUILD_DIR)]
    pub build_dir: PathBuf,
    #[arg(long, default_value = DEFAULT_DIST_DIR)]
    pub dist_dir: PathBuf,

    /// Write one zip archive per variant group
    #[arg(long)]
    pub archive: bool,

    /// Build CN variants in addition to Latin ones
    #[arg(long, group = "cn_axis")]
    pub cn: bool,
    /// Build only CN variants
    #[arg(long, group = "cn_axis")]
    pub cn_only: bool,
    #[arg(long, group = "cn_axis")]
    pub no_cn: bool,
    /// Build CN variants with and without Nerd Font glyphs
    #[arg(long)]
    pub cn_both: bool,
    /// Clean the CN base font cache and fetch the fonts again
    #[arg(long)]
    pub cn_rebuild: bool,
    /// Make CN glyphs narrow (experimental)
    #[arg(long)]
    pub cn_narrow: bool,

    /// Build only the Normal family, without opinionated defaults
    #[arg(long, group = "normal_axis")]
    pub normal: bool,
    /// Build both the default and the Normal family
    #[arg(long, group = "normal_axis")]
    pub normal_both: bool,

    #[arg(long, group = "liga_axis")]
    pub liga: bool,
    #[arg(long, group = "liga_axis")]
    pub no_liga: bool,
    #[arg(long, group = "liga_axis")]
    pub liga_both: bool,

    #[arg(long, group = "hinted_axis")]
    pub hinted: bool,
    #[arg(long, group = "hinted_axis")]
    pub no_hinted: bool,
    #[arg(long, group = "hinted_axis")]
    pub hinted_both: bool,

    /// Build Nerd Font variants even if disabled in the configuration
    #[arg(long, group = "nerd_font_axis")]
    pub nerd_font: bool,
    #[arg(long, group = "nerd_font_axis")]
    pub no_nerd_font: bool,

    /// Comma-separated features to freeze on, e.g. 'cv01,ss08'
    #[arg(long, value_delimiter = ',')]
    pub feat: Vec<String>,
    /// Only build Regular, Bold, Italic and BoldItalic
    #[arg(long)]
    pub least_styles: bool,

    /// Print the resolved configuration and planned variants, then exit
    #[arg(long)]
    pub dry: bool,
    /// Add a `Debug` suffix to the family name and build the least styles
    #[arg(long)]
    pub debug: bool,
    /// Reuse cached fonts from earlier runs
    #[arg(long)]
    pub cache: bool,

    #[arg(long)]
    pub pool_size: Option<usize>,
    /// Font version, e.g. v7.1 or v7.1-beta3
    #[arg(long, default_value = FONT_VERSION)]
    pub font_version: String,

    /// Glyph merger program
    #[arg(long, default_value = "pyftmerge")]
    pub merger: PathBuf,
    #[arg(long, default_value = "ttfautohint")]
    pub autohinter: PathBuf,
    #[arg(long, default_value = "fontforge")]
    pub fontforge: PathBuf,
    /// Nerd Fonts font-patcher script; downloaded when not given
    #[arg(long)]
    pub font_patcher: Option<PathBuf>,
}

fn axis(only_true: bool, only_false: bool, both: bool) -> AxisSelection {
    match (only_true, only_false, both) {
        (_, _, true) => AxisSelection::Both,
        (true, _, _) => AxisSelection::Only(true),
        (_, true, _) => AxisSelection::Only(false),
        _ => AxisSelection::Configured,
    }
}

impl BuildArgs {
    pub fn overrides(&self) -> PlanOverrides {
        PlanOverrides {
            hinted: axis(self.hinted, self.no_hinted, self.hinted_both),
            cn: axis(self.cn_only, self.no_cn, self.cn),
            ligature: axis(self.liga, self.no_liga, self.liga_both),
            opinionated: axis(false, self.normal, self.normal_both),
            nerd_font: axis(false, self.no_nerd_font, self.nerd_font),
            cn_both: self.cn_both,
            extra_features: self.feat.iter().map(|f| f.trim().to_string()).collect(),
            least_styles: self.least_styles || self.debug,
        }
    }

    pub fn tools(&self) -> ToolPaths {
        ToolPaths {
            merger: self.merger.clone(),
            autohinter: self.autohinter.clone(),
            fontforge: self.fontforge.clone(),
            font_patcher: self.font_patcher.clone(),
        }
    }

    /// The configuration file with command-line settings applied.
    pub fn config(&self) -> Result<ConfigModel, ConfigError> {
        let mut document = ConfigDocument::load(&self.config)?;
        if let Some(pool_size) = self.pool_size {
            document.pool_size = pool_size;
        }
        if self.cn_rebuild {
            document.cn.clean_cache = true;
            document.cn.use_static_base_font = false;
        }
        if self.cn_narrow {
            document.cn.narrow = true;
        }
        let mut config = ConfigModel::from_document(document)?;
        if self.debug {
            config.family = config.family.debug();
        }
        Ok(config)
    }

    pub fn context(&self, config: &ConfigModel) -> Result<RunContext, ConfigError> {
        let version = FontVersion::parse(&self.font_version)
            .map_err(|e| ConfigError::FontVersion(format!("{e:#}")))?;
        let mut ctx =
            RunContext::new(&self.source_dir, &self.build_dir, &self.dist_dir, version)
                .with_config(config);
        ctx.use_cache = self.cache;
        ctx.archive = self.archive;
        ctx.tools = self.tools();
        Ok(ctx)
    }
}

pub fn build(args: &BuildArgs) -> Result<ExitCode> {
    let config = args.config()?;
    let ctx = args.context(&config)?;
    let overrides = args.overrides();

    if args.dry {
        dry_run(&config, &overrides, &ctx)?;
        return Ok(ExitCode::SUCCESS);
    }

    info!("Building with {} workers", ctx.pool_size);
    let toolkit = OpenTypeToolkit::new(ctx.tools.clone());
    let report = maple_core::build(&config, &overrides, &ctx, &toolkit)?;
    for issue in report.issues() {
        warn!("{issue}");
    }
    Ok(ExitCode::from(report.exit_code()))
}
