//! Analysis modules.
//!
//! Folds per-year records into the dashboard totals.

pub mod aggregator;

pub use aggregator::*;
