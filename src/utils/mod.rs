//! Utility modules shared across the crate.
//!
//! - `logging`: Tracing setup and error context
//! - `metrics`: Prometheus registry and reconciler counters
//! - `tests`: Builders for store fixtures

pub mod logging;
pub mod metrics;
pub mod tests;
