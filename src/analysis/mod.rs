//! Analysis modules.
//!
//! The aggregation engine is pure: it performs no I/O and keeps no state
//! between calls.

pub mod aggregator;

pub use aggregator::*;
