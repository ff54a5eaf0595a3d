//! Data models for benchmark timings.
//!
//! This module contains the structures that flow through the pipeline:
//! per-key run data parsed from the game, the per-key summaries derived
//! from it, and the report that gets printed or serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-tick durations (in milliseconds) for one key across all runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySeries {
    /// Timing category name.
    pub key: String,
    /// One tick sequence per run.
    pub runs: Vec<Vec<f64>>,
}

/// Run data for every tracked key, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyTimes {
    pub series: Vec<KeySeries>,
}

impl KeyTimes {
    /// Creates an empty entry for each key.
    pub fn with_keys<S: AsRef<str>>(keys: &[S]) -> Self {
        Self {
            series: keys
                .iter()
                .map(|k| KeySeries {
                    key: k.as_ref().to_string(),
                    runs: Vec::new(),
                })
                .collect(),
        }
    }

    /// Returns the runs recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&[Vec<f64>]> {
        self.series
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.runs.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeySeries> {
        self.series.iter()
    }
}

/// Total/mean/max/count of a reduced tick sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: f64,
    pub mean: f64,
    pub max: f64,
    pub count: usize,
}

/// Where a key's timings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Verbose benchmark output on stdout.
    Benchmark,
    /// Profiling CSV written by the mod.
    Profile,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Benchmark => write!(f, "benchmark"),
            Source::Profile => write!(f, "profile"),
        }
    }
}

/// One row of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySummary {
    pub key: String,
    pub source: Source,
    #[serde(flatten)]
    pub summary: Summary,
}

/// Metadata about a benchmark session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Mod source directory that was benchmarked.
    pub mod_path: String,
    /// Save file passed to the game.
    pub save: String,
    /// Number of benchmark runs.
    pub runs: usize,
    /// Ticks per run.
    pub ticks: usize,
    /// Whether profiling instrumentation was enabled.
    pub profiling: bool,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Version of this tool.
    pub tool_version: String,
}

/// One `name, value` pair from the profiling totals file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileTotal {
    pub name: String,
    pub value: String,
}

/// Profiling totals written by the mod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileTotals {
    /// Console summary line; only the entries are serialized.
    #[serde(skip)]
    pub line: String,
    pub entries: Vec<ProfileTotal>,
}

/// The complete benchmark report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchReport {
    pub metadata: ReportMetadata,
    /// Profiling totals, if profiling was enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<ProfileTotals>,
    pub rows: Vec<KeySummary>,
}
