//! Benchmark runner and timing aggregator for game mods.
//!
//! The game does the actual simulation in benchmark mode and prints one
//! line of timings per tick. This crate prepares the mod, runs the game,
//! reduces repeated runs to the fastest time per tick and reports
//! total/average/maximum per timing key.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod report;

pub use error::{BenchError, Result};
