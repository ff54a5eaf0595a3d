//! Error types for parsing benchmark output and driving the game.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias using [`BenchError`].
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors raised by the timing pipeline and its collaborators.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The benchmark output is shorter than the run/tick layout requires.
    #[error("Benchmark output has {actual} lines, expected at least {expected} for {runs} runs of {ticks} ticks")]
    TooFewLines {
        actual: usize,
        expected: usize,
        runs: usize,
        ticks: usize,
    },

    /// The run/tick layout does not fit in memory addressing.
    #[error("{runs} runs of {ticks} ticks is too large to parse")]
    LayoutTooLarge { runs: usize, ticks: usize },

    /// A data line does not carry a value for every key.
    #[error("Line {line}: expected at least {expected} fields, found {actual}: {content:?}")]
    TooFewFields {
        line: usize,
        expected: usize,
        actual: usize,
        content: String,
    },

    /// A field could not be parsed as a number.
    #[error("Line {line}: invalid number {value:?}: {source}")]
    InvalidNumber {
        line: usize,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// Reduction produced no ticks, so no mean exists.
    #[error("No timing samples to summarize")]
    EmptySeries,

    /// Neither toggle literal was found in the instrumentation file.
    #[error("Neither {enabled:?} nor {disabled:?} found in {}", .path.display())]
    InstrumentationMarkerMissing {
        path: PathBuf,
        enabled: String,
        disabled: String,
    },

    /// The game binary exited unsuccessfully.
    #[error("Benchmark process exited with {status}")]
    ProcessFailed { status: ExitStatus, stderr: String },

    /// The mod link path holds something other than a symlink.
    #[error("Refusing to replace {}: it exists and is not a symlink", .0.display())]
    NotASymlink(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_few_fields_message() {
        let err = BenchError::TooFewFields {
            line: 7,
            expected: 4,
            actual: 2,
            content: "1,2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Line 7"));
        assert!(msg.contains("\"1,2\""));
    }

    #[test]
    fn test_process_failed_message_omits_stderr() {
        let err = BenchError::ProcessFailed {
            status: failed_status(),
            stderr: "Error: save not found\n".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Benchmark process exited with"));
        assert!(!msg.contains("save not found"));
    }

    #[test]
    fn test_layout_too_large_message() {
        let err = BenchError::LayoutTooLarge { runs: 3, ticks: usize::MAX };
        assert!(err.to_string().starts_with("3 runs of"));
    }

    #[cfg(unix)]
    fn failed_status() -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(1 << 8)
    }

    #[cfg(windows)]
    fn failed_status() -> ExitStatus {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(1)
    }
}
