//! Collaborators that prepare and run the game.

pub mod installer;
pub mod instrumentation;
pub mod runner;

pub use installer::install_mod;
pub use instrumentation::{InstrumentationToggle, ProfilingState, ToggleOutcome};
pub use runner::{read_captured_output, GameRunner, ProfileFiles, RunOptions, RunOutput};
