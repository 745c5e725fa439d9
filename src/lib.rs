//! Indexer block log reconciler.
//!
//! Detects heights whose derived datasets (transactions, impacted addresses,
//! logged events, involved-account transfers, special events) disagree with
//! the authoritative block log, and queues them for reprocessing.
//!
//! # Architecture
//!
//! - `models`: Domain types, the dataset table and configuration
//! - `services`: Store access, reconciliation and notifications
//! - `utils`: Logging, metrics and test builders

pub mod models;
pub mod services;
pub mod utils;
