//! Parsing of raw benchmark output and profiling CSVs.
//!
//! The game prints one block per run when `--benchmark-verbose` is set: two
//! header lines followed by one comma separated line per tick. The first
//! and last fields of a tick line are not timings; the ones in between
//! follow the order of the requested keys, in nanoseconds.

use crate::error::{BenchError, Result};
use crate::models::{KeyTimes, ProfileTotal, ProfileTotals};
use anyhow::Context;
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Nanoseconds per millisecond.
pub const NS_PER_MS: f64 = 1_000_000.0;

/// Header lines preceding the tick lines of each run.
const RUN_HEADER_LINES: usize = 2;

/// Lines after the last run that are not part of any run.
const TRAILER_LINES: usize = 2;

/// Default pattern for duration tokens in profiling CSVs.
pub const DEFAULT_DURATION_PATTERN: &str = r"Duration: (.+?)ms";

/// Parse per-tick timings for `keys` out of the game's verbose output.
///
/// Only the tail of `raw` is looked at: the last two lines are dropped and
/// the `runs * (ticks + 2)` lines before them are split into runs.
pub fn parse_runs<S: AsRef<str>>(
    raw: &str,
    keys: &[S],
    runs: usize,
    ticks: usize,
) -> Result<KeyTimes> {
    let lines: Vec<&str> = raw.split('\n').collect();
    let (block_len, expected) = layout_len(runs, ticks)?;

    if lines.len() < expected {
        return Err(BenchError::TooFewLines {
            actual: lines.len(),
            expected,
            runs,
            ticks,
        });
    }

    let window_start = lines.len() - expected;
    debug!(
        "Parsing {} runs x {} ticks from line {} of {}",
        runs,
        ticks,
        window_start + 1,
        lines.len()
    );

    let mut key_times = KeyTimes::with_keys(keys);
    let min_fields = keys.len() + 2;

    for run in 0..runs {
        let data_start = window_start + run * block_len + RUN_HEADER_LINES;
        let mut run_times: Vec<Vec<f64>> = vec![Vec::with_capacity(ticks); keys.len()];

        for (offset, line) in lines[data_start..data_start + ticks].iter().enumerate() {
            let line_no = data_start + offset + 1;
            let fields: Vec<&str> = line.split(',').collect();

            if fields.len() < min_fields {
                return Err(BenchError::TooFewFields {
                    line: line_no,
                    expected: min_fields,
                    actual: fields.len(),
                    content: line.to_string(),
                });
            }

            for (times, field) in run_times.iter_mut().zip(&fields[1..fields.len() - 1]) {
                times.push(parse_number(field, line_no)? / NS_PER_MS);
            }
        }

        for (series, times) in key_times.series.iter_mut().zip(run_times) {
            series.runs.push(times);
        }
    }

    Ok(key_times)
}

/// Lines per run and lines the whole output must have at least.
fn layout_len(runs: usize, ticks: usize) -> Result<(usize, usize)> {
    let block_len = ticks.checked_add(RUN_HEADER_LINES);
    let expected = block_len
        .and_then(|block| block.checked_mul(runs))
        .and_then(|window| window.checked_add(TRAILER_LINES));

    match (block_len, expected) {
        (Some(block_len), Some(expected)) => Ok((block_len, expected)),
        _ => Err(BenchError::LayoutTooLarge { runs, ticks }),
    }
}

/// Read a profiling CSV and extract the duration tokens of every line.
///
/// The header line is skipped. Each remaining line becomes one sequence,
/// which is empty when the line has no matching token.
pub fn parse_profile_csv(path: &Path, pattern: &Regex) -> anyhow::Result<Vec<Vec<f64>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profiling CSV: {}", path.display()))?;

    parse_profile_text(&content, pattern)
        .with_context(|| format!("Failed to parse profiling CSV: {}", path.display()))
}

/// Extract duration tokens from profiling CSV content.
pub fn parse_profile_text(content: &str, pattern: &Regex) -> Result<Vec<Vec<f64>>> {
    content
        .split('\n')
        .enumerate()
        .skip(1)
        .map(|(idx, line)| {
            pattern
                .captures_iter(line)
                .filter_map(|caps| caps.get(1))
                .map(|m| parse_number(m.as_str(), idx + 1))
                .collect::<Result<Vec<f64>>>()
        })
        .collect()
}

/// Compile the duration token pattern.
pub fn duration_regex(pattern: &str) -> anyhow::Result<Regex> {
    Regex::new(pattern).with_context(|| format!("Invalid duration pattern: {}", pattern))
}

/// Reformat the `name, value` totals CSV as a single summary line.
pub fn format_totals(csv: &str) -> String {
    format!(" Totals: {}", csv.replace(", ", " = ").replace('\n', ", "))
}

/// Split the `name, value` totals CSV into entries, keeping the console line.
///
/// Blank lines are skipped. A line without a separator becomes a name with
/// an empty value.
pub fn parse_totals(csv: &str) -> ProfileTotals {
    let entries = csv
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let (name, value) = line.split_once(',').unwrap_or((line, ""));
            ProfileTotal {
                name: name.trim().to_string(),
                value: value.trim().to_string(),
            }
        })
        .collect();

    ProfileTotals {
        line: format_totals(csv),
        entries,
    }
}

fn parse_number(field: &str, line: usize) -> Result<f64> {
    let trimmed = field.trim();
    trimmed
        .parse::<f64>()
        .map_err(|source| BenchError::InvalidNumber {
            line,
            value: trimmed.to_string(),
            source,
        })
}
