//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.tickbench.toml` files.

use crate::game::{InstrumentationToggle, ProfileFiles, RunOptions};
use crate::report::PlotConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".tickbench.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Game binary settings.
    #[serde(default)]
    pub game: GameConfig,

    /// Mod installation and instrumentation settings.
    #[serde(default, rename = "mod")]
    pub mod_config: ModConfig,

    /// Benchmark run settings.
    #[serde(default)]
    pub benchmark: BenchmarkConfig,

    /// Plot settings.
    #[serde(default)]
    pub plot: PlotSettings,
}

/// Game binary settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Path to the game binary.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Save file to benchmark.
    #[serde(default = "default_save")]
    pub save: String,

    /// The game's script output directory; the game runs here and the mod
    /// writes its profiling CSVs here.
    #[serde(default = "default_script_output_dir")]
    pub script_output_dir: PathBuf,

    /// Keep going when the game exits unsuccessfully.
    #[serde(default)]
    pub allow_failure: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            save: default_save(),
            script_output_dir: default_script_output_dir(),
            allow_failure: false,
        }
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("factorio")
}

fn default_save() -> String {
    "devOriginalBench2".to_string()
}

fn default_script_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Mod installation and instrumentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModConfig {
    /// Mod checkout to benchmark.
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Symlink the game loads the mod from, relative to the script output dir.
    #[serde(default = "default_link")]
    pub link: PathBuf,

    /// Source file holding the profiling constant, relative to the mod source.
    #[serde(default = "default_instrumentation_file")]
    pub instrumentation_file: PathBuf,

    /// Name of the profiling constant.
    #[serde(default = "default_profiling_constant")]
    pub profiling_constant: String,

    /// Value that enables profiling.
    #[serde(default = "default_enabled_value")]
    pub enabled_value: String,

    /// Value that disables profiling.
    #[serde(default = "default_disabled_value")]
    pub disabled_value: String,
}

impl Default for ModConfig {
    fn default() -> Self {
        Self {
            source: None,
            link: default_link(),
            instrumentation_file: default_instrumentation_file(),
            profiling_constant: default_profiling_constant(),
            enabled_value: default_enabled_value(),
            disabled_value: default_disabled_value(),
        }
    }
}

fn default_link() -> PathBuf {
    PathBuf::from("../mods/cybersyn")
}

fn default_instrumentation_file() -> PathBuf {
    PathBuf::from("scripts/central-planning.lua")
}

fn default_profiling_constant() -> String {
    "PROFILING_ENABLED".to_string()
}

fn default_enabled_value() -> String {
    "true".to_string()
}

fn default_disabled_value() -> String {
    "nil".to_string()
}

/// Benchmark run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Number of runs.
    #[serde(default = "default_runs")]
    pub runs: usize,

    /// Ticks per run.
    #[serde(default = "default_ticks")]
    pub ticks: usize,

    /// Timing keys reported by the game.
    #[serde(default = "default_keys")]
    pub keys: Vec<String>,

    /// Timing keys written to profiling CSVs by the mod.
    #[serde(default = "default_profile_keys")]
    pub profile_keys: Vec<String>,

    /// Enable the mod's profiling instrumentation.
    #[serde(default)]
    pub profiling: bool,

    /// File name prefix of the profiling CSVs.
    #[serde(default = "default_csv_prefix")]
    pub csv_prefix: String,

    /// Pattern capturing one duration (ms) in a profiling CSV line.
    #[serde(default = "default_duration_pattern")]
    pub duration_pattern: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            ticks: default_ticks(),
            keys: default_keys(),
            profile_keys: default_profile_keys(),
            profiling: false,
            csv_prefix: default_csv_prefix(),
            duration_pattern: default_duration_pattern(),
        }
    }
}

fn default_runs() -> usize {
    4
}

fn default_ticks() -> usize {
    36000 // 10 minutes of game time
}

fn default_keys() -> Vec<String> {
    vec!["wholeUpdate", "scriptUpdate"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_profile_keys() -> Vec<String> {
    vec!["tick_poll_station", "tick_dispatch"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_csv_prefix() -> String {
    "cybersyn_".to_string()
}

fn default_duration_pattern() -> String {
    crate::analysis::DEFAULT_DURATION_PATTERN.to_string()
}

/// Plot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotSettings {
    /// Render a plot per key.
    #[serde(default)]
    pub enabled: bool,

    /// Plot ticks sorted from slowest to fastest.
    #[serde(default)]
    pub sort_descending: bool,

    /// Plot width in characters.
    #[serde(default = "default_plot_width")]
    pub width: usize,

    /// Plot height in characters.
    #[serde(default = "default_plot_height")]
    pub height: usize,

    /// Fixed top of the y axis in ms.
    #[serde(default)]
    pub y_max: Option<f64>,

    /// Directory to write plots to instead of printing them.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            sort_descending: false,
            width: default_plot_width(),
            height: default_plot_height(),
            y_max: None,
            output_dir: None,
        }
    }
}

fn default_plot_width() -> usize {
    100
}

fn default_plot_height() -> usize {
    20
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from `path`.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref source) = args.mod_source {
            self.mod_config.source = Some(source.clone());
        }
        if let Some(ref binary) = args.binary {
            self.game.binary = binary.clone();
        }
        if let Some(ref save) = args.save {
            self.game.save = save.clone();
        }
        if let Some(ref dir) = args.script_output_dir {
            self.game.script_output_dir = dir.clone();
        }
        if args.allow_failure {
            self.game.allow_failure = true;
        }

        if let Some(runs) = args.runs {
            self.benchmark.runs = runs;
        }
        if let Some(ticks) = args.ticks {
            self.benchmark.ticks = ticks;
        }
        if let Some(ref keys) = args.keys {
            self.benchmark.keys = keys.clone();
        }
        if let Some(ref keys) = args.profile_keys {
            self.benchmark.profile_keys = keys.clone();
        }
        if args.profiling {
            self.benchmark.profiling = true;
        } else if args.no_profiling {
            self.benchmark.profiling = false;
        }

        if args.plot {
            self.plot.enabled = true;
        }
        if args.sort_plots {
            self.plot.enabled = true;
            self.plot.sort_descending = true;
        }
        if let Some(ref dir) = args.plot_dir {
            self.plot.enabled = true;
            self.plot.output_dir = Some(dir.clone());
        }
    }

    /// Check that the merged configuration can drive a benchmark.
    ///
    /// The mod source is only needed when the game is actually run.
    pub fn validate(&self, runs_game: bool) -> Result<()> {
        if self.benchmark.runs == 0 {
            bail!("benchmark.runs must be at least 1");
        }
        if self.benchmark.ticks == 0 {
            bail!("benchmark.ticks must be at least 1");
        }
        if self.benchmark.keys.is_empty() {
            bail!("benchmark.keys must name at least one timing key");
        }
        if self.benchmark.keys.iter().any(|k| k.contains(',')) {
            bail!("benchmark.keys must not contain commas");
        }
        if self.plot.width < 2 || self.plot.height < 2 {
            bail!("plot.width and plot.height must be at least 2");
        }
        if let Some(y_max) = self.plot.y_max {
            if y_max.is_nan() || y_max <= 0.0 {
                bail!("plot.y_max must be positive");
            }
        }
        if runs_game && self.mod_config.source.is_none() {
            bail!("mod.source is not set; pass --mod-source or set it in {DEFAULT_CONFIG_FILE}");
        }
        Ok(())
    }

    /// Mod checkout being benchmarked, if configured.
    pub fn mod_source(&self) -> Option<&Path> {
        self.mod_config.source.as_deref()
    }

    /// Where the mod symlink lives.
    pub fn link_path(&self) -> PathBuf {
        self.game.script_output_dir.join(&self.mod_config.link)
    }

    /// The instrumentation toggle inside `source`.
    pub fn instrumentation(&self, source: &Path) -> InstrumentationToggle {
        InstrumentationToggle::new(
            source.join(&self.mod_config.instrumentation_file),
            &self.mod_config.profiling_constant,
            &self.mod_config.enabled_value,
            &self.mod_config.disabled_value,
        )
    }

    /// Profiling CSV locations.
    pub fn profile_files(&self) -> ProfileFiles {
        ProfileFiles::new(
            self.game.script_output_dir.clone(),
            self.benchmark.csv_prefix.clone(),
        )
    }

    /// Options for invoking the game.
    pub fn run_options(&self, show_progress: bool) -> RunOptions {
        RunOptions {
            binary: self.game.binary.clone(),
            save: self.game.save.clone(),
            keys: self.benchmark.keys.clone(),
            runs: self.benchmark.runs,
            ticks: self.benchmark.ticks,
            working_dir: self.game.script_output_dir.clone(),
            allow_failure: self.game.allow_failure,
            show_progress,
        }
    }

    /// Plot renderer settings, titled with `title_prefix`.
    pub fn plot_config(&self, title_prefix: &str) -> PlotConfig {
        PlotConfig {
            title_prefix: title_prefix.to_string(),
            width: self.plot.width,
            height: self.plot.height,
            sort_descending: self.plot.sort_descending,
            y_max: self.plot.y_max,
            output_dir: self.plot.output_dir.clone(),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
