//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Every setting is optional here so that values
//! from `.tickbench.toml` are only overridden when given explicitly.

use clap::Parser;
use std::path::PathBuf;

/// tickbench - benchmark a game mod and summarize per-tick timings
///
/// Points the game's mod symlink at a checkout, toggles the mod's profiling
/// instrumentation, runs the game in benchmark mode and prints the fastest
/// observed time per tick, summarized per timing key.
///
/// Examples:
///   tickbench --mod-source ../project-cybersyn/cybersyn
///   tickbench --mod-source ./cybersyn --runs 2 --ticks 600 --profiling
///   tickbench --input bench-output.txt --format json
///   tickbench --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .tickbench.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Mod checkout to benchmark
    #[arg(short, long, value_name = "DIR")]
    pub mod_source: Option<PathBuf>,

    /// Game binary
    #[arg(long, value_name = "FILE", env = "TICKBENCH_BINARY")]
    pub binary: Option<PathBuf>,

    /// Save file to benchmark
    #[arg(short, long, value_name = "NAME")]
    pub save: Option<String>,

    /// The game's script output directory
    ///
    /// The game runs from here and the mod writes its profiling CSVs here.
    #[arg(long, value_name = "DIR")]
    pub script_output_dir: Option<PathBuf>,

    /// Number of benchmark runs
    #[arg(short, long, value_name = "COUNT")]
    pub runs: Option<usize>,

    /// Ticks per run
    #[arg(short, long, value_name = "COUNT")]
    pub ticks: Option<usize>,

    /// Timing keys to report (comma-separated)
    ///
    /// Example: --keys wholeUpdate,scriptUpdate
    #[arg(long, value_name = "KEYS", value_delimiter = ',')]
    pub keys: Option<Vec<String>>,

    /// Profiling CSV keys to report (comma-separated)
    #[arg(long, value_name = "KEYS", value_delimiter = ',')]
    pub profile_keys: Option<Vec<String>>,

    /// Enable the mod's profiling instrumentation and report its CSVs
    #[arg(long, conflicts_with = "no_profiling")]
    pub profiling: bool,

    /// Disable the mod's profiling instrumentation
    #[arg(long, conflicts_with = "profiling")]
    pub no_profiling: bool,

    /// Plot each key's per-tick timings
    #[arg(long)]
    pub plot: bool,

    /// Plot ticks sorted from slowest to fastest (implies --plot)
    #[arg(long)]
    pub sort_plots: bool,

    /// Write plots to this directory instead of the terminal (implies --plot)
    #[arg(long, value_name = "DIR")]
    pub plot_dir: Option<PathBuf>,

    /// Analyze previously captured benchmark output instead of running the game
    ///
    /// Skips mod installation, instrumentation and the game process.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Save the game's raw benchmark output to a file
    #[arg(long, value_name = "FILE", conflicts_with = "input")]
    pub save_output: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(long, default_value = "table", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Parse the output even if the game exits unsuccessfully
    #[arg(long)]
    pub allow_failure: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .tickbench.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Box-drawing table (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.runs == Some(0) {
            return Err("Runs must be at least 1".to_string());
        }

        if self.ticks == Some(0) {
            return Err("Ticks must be at least 1".to_string());
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        if let Some(ref source) = self.mod_source {
            if !source.is_dir() {
                return Err(format!(
                    "Mod source is not a directory: {}",
                    source.display()
                ));
            }
        }

        Ok(())
    }

    /// Whether the game process will be run.
    pub fn runs_game(&self) -> bool {
        self.input.is_none()
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
