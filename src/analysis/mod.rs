//! Aggregation engine: pure transforms from validated session records
//! to the summary views.

pub mod aggregator;
pub mod trend;

pub use aggregator::*;
