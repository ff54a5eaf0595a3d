//! Timing analysis.
//!
//! Parsing of the game's output and reduction of per-tick timings into
//! summary statistics.

pub mod aggregator;
pub mod parser;

pub use aggregator::*;
pub use parser::*;
