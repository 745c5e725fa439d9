//! Block log reconciliation.
//!
//! This module checks the indexer's derived datasets against the block log
//! and requests reprocessing of inconsistent heights. It includes:
//! - Height checks and diagnosis
//! - The repair queue and repair notifications
//! - On-demand and sweep entry points
//! - The cron-driven sweep scheduler
//! - Error handling specific to reconciliation

mod check;
mod error;
mod orchestrator;
mod repair;
mod service;

pub use check::{check_range, diagnose_height, CheckOutcome, DatasetDiagnosis, Violation};
pub use error::ReconcilerError;
pub use orchestrator::{CleanupResult, LookupResult, NetworkStore, NetworkStores, Reconciler};
pub use repair::{enqueue_repair, format_height, read_repair_queue, repair_message, request_repair};
pub use service::{CleanupScheduler, JobSchedulerTrait};
