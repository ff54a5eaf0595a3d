//! Report output: the console table, JSON, and optional plots.

pub mod generator;
pub mod plot;

pub use generator::*;
pub use plot::{NoopRenderer, PlotConfig, Renderer, TerminalPlotRenderer};
