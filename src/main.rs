//! tickbench - benchmark runner and timing aggregator for game mods
//!
//! Runs the game in benchmark mode against a mod checkout, then reduces the
//! per-tick timings of every run to the fastest observed time per tick and
//! prints total/average/maximum per timing key.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (configuration, filesystem, game process, parsing)

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tickbench::analysis;
use tickbench::cli::{Args, OutputFormat};
use tickbench::config::{Config, DEFAULT_CONFIG_FILE};
use tickbench::game::{self, GameRunner, ProfilingState};
use tickbench::models::{BenchReport, ReportMetadata};
use tickbench::report::{self, NoopRenderer, Renderer, TerminalPlotRenderer};
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("tickbench v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("Benchmark failed: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .tickbench.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Set `source` under [mod] to the mod checkout you want to benchmark.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout only carries the report.
fn init_logging(args: &Args) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the complete benchmark workflow.
fn run(args: &Args) -> Result<()> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate(args.runs_game())?;

    let stdout = match args.input {
        Some(ref input) => {
            info!("Reading captured benchmark output: {}", input.display());
            game::read_captured_output(input)?
        }
        None => run_benchmark(&config, args)?,
    };

    let mod_path = match (config.mod_source(), &args.input) {
        (Some(source), _) => source.display().to_string(),
        (None, Some(input)) => input.display().to_string(),
        (None, None) => String::new(),
    };

    let mut renderer: Box<dyn Renderer> = if config.plot.enabled {
        Box::new(TerminalPlotRenderer::new(config.plot_config(&mod_path)))
    } else {
        Box::new(NoopRenderer)
    };

    let report = build_report(&config, &stdout, mod_path, renderer.as_mut())?;

    match args.format {
        OutputFormat::Table => print!("{}", report::generate_table_report(&report)),
        OutputFormat::Json => println!("{}", report::generate_json_report(&report)?),
    }

    renderer.finish()
}

/// Summarize benchmark output and, when profiling, the mod's CSVs.
///
/// Benchmark rows come first in key order, followed by one row per
/// profiling key.
fn build_report(
    config: &Config,
    stdout: &str,
    mod_path: String,
    renderer: &mut dyn Renderer,
) -> Result<BenchReport> {
    let bench = &config.benchmark;
    let key_times = analysis::parse_runs(stdout, &bench.keys, bench.runs, bench.ticks)
        .context("Failed to parse benchmark output")?;
    let mut rows = analysis::summarize_key_times(&key_times, renderer)?;

    let totals = if bench.profiling {
        let files = config.profile_files();
        let totals_path = files.totals();
        let totals_csv = std::fs::read_to_string(&totals_path).with_context(|| {
            format!("Failed to read profiling totals: {}", totals_path.display())
        })?;

        let pattern = analysis::duration_regex(&bench.duration_pattern)?;
        for key in &bench.profile_keys {
            let lines = analysis::parse_profile_csv(&files.for_key(key), &pattern)?;
            rows.push(analysis::summarize_profile(key, lines, renderer)?);
        }

        Some(analysis::parse_totals(&totals_csv))
    } else {
        None
    };

    Ok(BenchReport {
        metadata: ReportMetadata {
            mod_path,
            save: config.game.save.clone(),
            runs: bench.runs,
            ticks: bench.ticks,
            profiling: bench.profiling,
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        totals,
        rows,
    })
}

/// Install the mod, set up instrumentation and run the game.
///
/// Returns the game's stdout.
fn run_benchmark(config: &Config, args: &Args) -> Result<String> {
    let source = config.mod_source().context("mod.source is not set")?;
    // The link must not depend on the directory it is created from.
    let source = std::fs::canonicalize(source)
        .with_context(|| format!("Mod source not found: {}", source.display()))?;

    game::install_mod(&config.link_path(), &source)?;

    let state = ProfilingState::from(config.benchmark.profiling);
    config.instrumentation(&source).apply(state)?;

    config.profile_files().clear(&config.benchmark.profile_keys)?;

    let mut options = config.run_options(!args.quiet);
    options.binary = resolve_binary(&options.binary)?;

    let output = GameRunner::new(options).run()?;
    info!("Benchmark finished in {:.1}s", output.elapsed.as_secs_f64());

    if let Some(ref path) = args.save_output {
        std::fs::write(path, &output.stdout)
            .with_context(|| format!("Failed to save benchmark output to {}", path.display()))?;
        info!("Saved benchmark output to {}", path.display());
    }

    Ok(output.stdout)
}

/// Make a relative binary path with directories absolute.
///
/// The game runs in the script output directory, so `bin/x64/factorio`
/// would otherwise be looked up from there. Bare names go through `PATH`.
fn resolve_binary(binary: &Path) -> Result<PathBuf> {
    if binary.is_relative() && binary.components().count() > 1 {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Ok(cwd.join(binary))
    } else {
        Ok(binary.to_path_buf())
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    resolve_config(args, Path::new(DEFAULT_CONFIG_FILE))
}

/// Load the explicit config, else `default_path` if it exists, else defaults.
///
/// A config file that exists but cannot be read or parsed is an error.
fn resolve_config(args: &Args, default_path: &Path) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_optional(default_path)? {
        Some(config) => {
            info!("Loaded default config from {}", default_path.display());
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
