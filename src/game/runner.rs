//! Game process invocation.
//!
//! The game is run in benchmark mode as a blocking child process. Its
//! stdout carries the verbose per-tick timings; stderr is only shown to the
//! operator.

use crate::error::BenchError;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Profiling CSVs written by the mod into the script output directory.
#[derive(Debug, Clone)]
pub struct ProfileFiles {
    dir: PathBuf,
    prefix: String,
}

impl ProfileFiles {
    pub fn new(dir: PathBuf, prefix: impl Into<String>) -> Self {
        Self {
            dir,
            prefix: prefix.into(),
        }
    }

    /// Path of the `name, value` totals file.
    pub fn totals(&self) -> PathBuf {
        self.dir.join(format!("{}totals.csv", self.prefix))
    }

    /// Path of the per-tick file for `key`.
    pub fn for_key(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{}.csv", self.prefix, key))
    }

    /// Delete the totals file and the file of every key, if present.
    pub fn clear<S: AsRef<str>>(&self, keys: &[S]) -> Result<()> {
        let paths = std::iter::once(self.totals())
            .chain(keys.iter().map(|k| self.for_key(k.as_ref())));

        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("Removed stale profile file: {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to remove {}", path.display()))
                }
            }
        }

        Ok(())
    }
}

/// Settings for one benchmark invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Game binary.
    pub binary: PathBuf,
    /// Save to benchmark.
    pub save: String,
    /// Timing keys requested with `--benchmark-verbose`.
    pub keys: Vec<String>,
    /// Number of runs.
    pub runs: usize,
    /// Ticks per run.
    pub ticks: usize,
    /// Working directory for the game (its script output directory).
    pub working_dir: PathBuf,
    /// Continue after a non-zero exit status.
    pub allow_failure: bool,
    /// Show a spinner while the game runs.
    pub show_progress: bool,
}

/// Captured output of a benchmark invocation.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Runs the game in benchmark mode.
pub struct GameRunner {
    options: RunOptions,
}

impl GameRunner {
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// Command-line arguments passed to the game.
    pub fn benchmark_args(&self) -> Vec<String> {
        vec![
            "--benchmark".to_string(),
            self.options.save.clone(),
            "--benchmark-verbose".to_string(),
            self.options.keys.join(","),
            "--benchmark-runs".to_string(),
            self.options.runs.to_string(),
            "--benchmark-ticks".to_string(),
            self.options.ticks.to_string(),
        ]
    }

    /// Run the benchmark and wait for it to finish.
    pub fn run(&self) -> Result<RunOutput> {
        let args = self.benchmark_args();
        info!(
            "Running {} {}",
            self.options.binary.display(),
            args.join(" ")
        );

        let spinner = self.options.show_progress.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message(format!(
                "Benchmarking {} ({} runs x {} ticks)",
                self.options.save, self.options.runs, self.options.ticks
            ));
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });

        let start = Instant::now();
        let result = Command::new(&self.options.binary)
            .args(&args)
            .current_dir(&self.options.working_dir)
            .output();
        let elapsed = start.elapsed();

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let output = result.with_context(|| {
            format!(
                "Failed to start benchmark process: {}",
                self.options.binary.display()
            )
        })?;

        let run = RunOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed,
        };

        debug!(
            "Benchmark process finished in {:.1}s with {} ({} bytes stdout)",
            run.elapsed.as_secs_f64(),
            run.status,
            run.stdout.len()
        );

        if !run.stderr.trim().is_empty() {
            warn!("Benchmark process wrote to stderr");
            eprintln!("{}", run.stderr.trim_end());
        }

        check_status(&run, self.options.allow_failure)?;
        Ok(run)
    }
}

fn check_status(run: &RunOutput, allow_failure: bool) -> Result<()> {
    if run.status.success() {
        return Ok(());
    }
    if allow_failure {
        warn!(
            "Benchmark process exited with {}; parsing its output anyway",
            run.status
        );
        return Ok(());
    }
    Err(BenchError::ProcessFailed {
        status: run.status,
        stderr: run.stderr.clone(),
    }
    .into())
}

/// Read previously captured benchmark output.
pub fn read_captured_output(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read benchmark output: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(binary: &str, working_dir: &Path) -> RunOptions {
        RunOptions {
            binary: PathBuf::from(binary),
            save: "devOriginalBench2".to_string(),
            keys: vec!["wholeUpdate".to_string(), "scriptUpdate".to_string()],
            runs: 4,
            ticks: 36000,
            working_dir: working_dir.to_path_buf(),
            allow_failure: false,
            show_progress: false,
        }
    }

    #[test]
    fn test_benchmark_args() {
        let runner = GameRunner::new(options("factorio", Path::new(".")));
        assert_eq!(
            runner.benchmark_args(),
            vec![
                "--benchmark",
                "devOriginalBench2",
                "--benchmark-verbose",
                "wholeUpdate,scriptUpdate",
                "--benchmark-runs",
                "4",
                "--benchmark-ticks",
                "36000",
            ]
        );
    }

    #[test]
    fn test_profile_file_names() {
        let files = ProfileFiles::new(PathBuf::from("out"), "cybersyn_");
        assert_eq!(files.totals(), PathBuf::from("out/cybersyn_totals.csv"));
        assert_eq!(
            files.for_key("tick_dispatch"),
            PathBuf::from("out/cybersyn_tick_dispatch.csv")
        );
    }

    #[test]
    fn test_clear_profile_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = ProfileFiles::new(dir.path().to_path_buf(), "cybersyn_");
        std::fs::write(files.totals(), "a, 1").unwrap();
        std::fs::write(files.for_key("tick_dispatch"), "header").unwrap();
        let unrelated = dir.path().join("other.csv");
        std::fs::write(&unrelated, "keep").unwrap();

        let keys = ["tick_poll_station", "tick_dispatch"];
        files.clear(&keys).unwrap();
        files.clear(&keys).unwrap();

        assert!(!files.totals().exists());
        assert!(!files.for_key("tick_dispatch").exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn test_missing_binary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let runner = GameRunner::new(options("/nonexistent/tickbench-game", dir.path()));
        assert!(runner.run().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_passes_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let runner = GameRunner::new(options("echo", dir.path()));

        let out = runner.run().unwrap();

        assert!(out.status.success());
        assert_eq!(
            out.stdout.trim_end(),
            "--benchmark devOriginalBench2 --benchmark-verbose wholeUpdate,scriptUpdate \
             --benchmark-runs 4 --benchmark-ticks 36000"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let runner = GameRunner::new(options("false", dir.path()));

        let err = runner.run().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BenchError>(),
            Some(BenchError::ProcessFailed { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options("false", dir.path());
        opts.allow_failure = true;

        let out = GameRunner::new(opts).run().unwrap();
        assert!(!out.status.success());
        assert!(out.stdout.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_exit_keeps_stderr_out_of_message() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("game.sh");
        std::fs::write(&script, "#!/bin/sh\necho 'Error: save not found' >&2\nexit 3\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = GameRunner::new(options(script.to_str().unwrap(), dir.path()))
            .run()
            .unwrap_err();
        match err.downcast_ref::<BenchError>() {
            Some(BenchError::ProcessFailed { status, stderr }) => {
                assert_eq!(status.code(), Some(3));
                assert!(stderr.contains("save not found"));
                assert!(!err.to_string().contains("save not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
