//! Profiling instrumentation toggle.
//!
//! The mod only writes its profiling CSVs when a constant in one of its
//! source files is set. Toggling rewrites that assignment in place.

use crate::error::BenchError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Desired state of the profiling constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilingState {
    Enabled,
    Disabled,
}

impl From<bool> for ProfilingState {
    fn from(enabled: bool) -> Self {
        if enabled {
            ProfilingState::Enabled
        } else {
            ProfilingState::Disabled
        }
    }
}

/// Outcome of [`InstrumentationToggle::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The file was rewritten.
    Changed,
    /// The file already had the requested state.
    Unchanged,
}

/// A constant in a source file that switches between two literal values.
#[derive(Debug, Clone)]
pub struct InstrumentationToggle {
    path: PathBuf,
    enabled: String,
    disabled: String,
}

impl InstrumentationToggle {
    /// Toggle `constant` in `path` between `enabled_value` and `disabled_value`.
    pub fn new(path: PathBuf, constant: &str, enabled_value: &str, disabled_value: &str) -> Self {
        Self {
            path,
            enabled: format!("{} = {}", constant, enabled_value),
            disabled: format!("{} = {}", constant, disabled_value),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the file so the constant has the requested state.
    pub fn apply(&self, state: ProfilingState) -> Result<ToggleOutcome> {
        let source = std::fs::read_to_string(&self.path).with_context(|| {
            format!(
                "Failed to read instrumentation file: {}",
                self.path.display()
            )
        })?;

        let (wanted, other) = match state {
            ProfilingState::Enabled => (&self.enabled, &self.disabled),
            ProfilingState::Disabled => (&self.disabled, &self.enabled),
        };

        if !source.contains(other.as_str()) {
            if source.contains(wanted.as_str()) {
                debug!("{} already set: {}", self.path.display(), wanted);
                return Ok(ToggleOutcome::Unchanged);
            }
            return Err(BenchError::InstrumentationMarkerMissing {
                path: self.path.clone(),
                enabled: self.enabled.clone(),
                disabled: self.disabled.clone(),
            }
            .into());
        }

        let updated = source.replace(other.as_str(), wanted);
        std::fs::write(&self.path, updated).with_context(|| {
            format!(
                "Failed to write instrumentation file: {}",
                self.path.display()
            )
        })?;

        info!("Set {} in {}", wanted, self.path.display());
        Ok(ToggleOutcome::Changed)
    }
}
