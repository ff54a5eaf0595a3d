//! Timing reduction and summary statistics.
//!
//! Repeated runs of the same save are noisy. Each tick index keeps the
//! fastest time observed across runs, and the statistics are computed over
//! that reduced series.

use crate::error::{BenchError, Result};
use crate::models::{KeySummary, KeyTimes, Source, Summary};
use crate::report::Renderer;
use tracing::debug;

/// Reduce runs to one series by taking the per-tick minimum.
///
/// Runs are aligned by tick index; the result is as long as the shortest run.
pub fn reduce_runs(runs: &[Vec<f64>]) -> Vec<f64> {
    let len = runs.iter().map(Vec::len).min().unwrap_or(0);

    (0..len)
        .map(|tick| {
            runs.iter()
                .map(|run| run[tick])
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

/// Compute total, mean, max and count of a series.
pub fn summarize(series: &[f64]) -> Result<Summary> {
    if series.is_empty() {
        return Err(BenchError::EmptySeries);
    }

    let total: f64 = series.iter().sum();
    let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let count = series.len();

    Ok(Summary {
        total,
        mean: total / count as f64,
        max,
        count,
    })
}

/// Reduce runs and summarize the reduced series.
pub fn reduce_and_summarize(runs: &[Vec<f64>]) -> Result<Summary> {
    summarize(&reduce_runs(runs))
}

/// Summarize one key and hand its reduced series to the renderer.
pub fn summarize_key(
    key: &str,
    source: Source,
    runs: &[Vec<f64>],
    renderer: &mut dyn Renderer,
) -> anyhow::Result<KeySummary> {
    let reduced = reduce_runs(runs);
    let summary = summarize(&reduced)?;
    debug!(
        "{} ({}): {} runs reduced to {} ticks",
        key,
        source,
        runs.len(),
        reduced.len()
    );

    renderer.render(key, &reduced)?;

    Ok(KeySummary {
        key: key.to_string(),
        source,
        summary,
    })
}

/// Summarize every key parsed from the benchmark output.
pub fn summarize_key_times(
    times: &KeyTimes,
    renderer: &mut dyn Renderer,
) -> anyhow::Result<Vec<KeySummary>> {
    let mut rows = Vec::with_capacity(times.series.len());
    for series in times.iter() {
        rows.push(summarize_key(
            &series.key,
            Source::Benchmark,
            &series.runs,
            renderer,
        )?);
    }
    Ok(rows)
}

/// Summarize one profiling key from its CSV lines.
///
/// Every line is a run and every duration token a tick. Lines without
/// tokens (such as the empty line after a trailing newline) are dropped.
pub fn summarize_profile(
    key: &str,
    lines: Vec<Vec<f64>>,
    renderer: &mut dyn Renderer,
) -> anyhow::Result<KeySummary> {
    let runs: Vec<Vec<f64>> = lines.into_iter().filter(|l| !l.is_empty()).collect();
    summarize_key(key, Source::Profile, &runs, renderer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NoopRenderer;

    struct Recorder(Vec<(String, Vec<f64>)>);

    impl Renderer for Recorder {
        fn render(&mut self, key: &str, series: &[f64]) -> anyhow::Result<()> {
            self.0.push((key.to_string(), series.to_vec()));
            Ok(())
        }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_two_runs_two_ticks() {
        let runs = vec![vec![2.0, 4.0], vec![3.0, 1.0]];
        assert_eq!(reduce_runs(&runs), vec![2.0, 1.0]);

        let s = reduce_and_summarize(&runs).unwrap();
        assert_close(s.total, 3.0);
        assert_close(s.mean, 1.5);
        assert_close(s.max, 2.0);
        assert_eq!(s.count, 2);
    }

    #[test]
    fn test_reduction_is_order_independent() {
        let runs = vec![
            vec![0.9, 0.2, 0.7, 0.4],
            vec![0.3, 0.8, 0.6, 0.5],
            vec![0.5, 0.1, 0.9, 0.2],
        ];
        let expected = reduce_and_summarize(&runs).unwrap();

        let orders = [[0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in orders {
            let permuted: Vec<Vec<f64>> = order.iter().map(|&i| runs[i].clone()).collect();
            assert_eq!(reduce_and_summarize(&permuted).unwrap(), expected);
        }
    }

    #[test]
    fn test_single_run_matches_plain_stats() {
        let run = vec![0.25, 1.5, 0.75, 0.5];
        let s = reduce_and_summarize(&[run.clone()]).unwrap();
        assert_close(s.total, 3.0);
        assert_close(s.mean, 0.75);
        assert_close(s.max, 1.5);
        assert_eq!(s.count, run.len());
    }

    #[test]
    fn test_constant_values() {
        let runs = vec![vec![0.5; 6], vec![0.5; 6]];
        let s = reduce_and_summarize(&runs).unwrap();
        assert_close(s.total, 3.0);
        assert_close(s.mean, 0.5);
        assert_close(s.max, 0.5);
        assert_eq!(s.count, 6);
    }

    #[test]
    fn test_unequal_runs_truncate_to_shortest() {
        let runs = vec![vec![1.0, 2.0, 3.0], vec![0.5, 4.0]];
        assert_eq!(reduce_runs(&runs), vec![0.5, 2.0]);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(
            reduce_and_summarize(&[]),
            Err(BenchError::EmptySeries)
        ));
        assert!(matches!(
            reduce_and_summarize(&[vec![]]),
            Err(BenchError::EmptySeries)
        ));
    }

    #[test]
    fn test_summarize_key_times_renders_reduced_series() {
        let mut times = KeyTimes::with_keys(&["wholeUpdate", "scriptUpdate"]);
        times.series[0].runs = vec![vec![2.0, 4.0], vec![3.0, 1.0]];
        times.series[1].runs = vec![vec![1.0, 1.0], vec![0.5, 2.0]];

        let mut recorder = Recorder(Vec::new());
        let rows = summarize_key_times(&times, &mut recorder).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "wholeUpdate");
        assert_eq!(rows[0].source, Source::Benchmark);
        assert_eq!(rows[1].summary.count, 2);
        assert_eq!(
            recorder.0,
            vec![
                ("wholeUpdate".to_string(), vec![2.0, 1.0]),
                ("scriptUpdate".to_string(), vec![0.5, 1.0]),
            ]
        );
    }

    #[test]
    fn test_summarize_profile_drops_empty_lines() {
        let lines = vec![vec![1.25, 2.5], vec![], vec![1.0, 3.0]];
        let row = summarize_profile("tick_dispatch", lines, &mut NoopRenderer).unwrap();

        assert_eq!(row.source, Source::Profile);
        assert_eq!(row.summary.count, 2);
        assert_close(row.summary.total, 3.5);
        assert_close(row.summary.max, 2.5);
    }

    #[test]
    fn test_summarize_profile_without_tokens_fails() {
        let err = summarize_profile("tick_dispatch", vec![vec![]], &mut NoopRenderer).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BenchError>(),
            Some(BenchError::EmptySeries)
        ));
    }
}
