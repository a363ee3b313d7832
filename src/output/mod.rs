//! Module related to output formatting and printing.

#[allow(clippy::module_inception)]
pub mod output;

pub use output::*;
