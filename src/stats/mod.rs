//! Repository statistics.
//!
//! The collector pages through the account's repositories and enriches
//! each one with commit activity; the aggregator folds the result into
//! the stats file.

pub mod aggregator;
pub mod collector;

pub use aggregator::summarize;
pub use collector::{collect, CollectOptions};
