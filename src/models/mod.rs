//! Domain models and data structures for block log reconciliation.
//!
//! - `config`: Configuration loading and validation
//! - `dataset`: Collections, content kinds and the dataset table
//! - `network`: Network selection
//! - `repair`: Repair queue and processing frontier helper records

mod config;
mod dataset;
mod network;
mod repair;

pub use config::{
	CleanupConfig, ConfigError, NetworkConfig, NotificationConfig, ReconcilerConfig,
	DEFAULT_CLEANUP_SCHEDULE, DEFAULT_CLEANUP_WINDOW,
};
pub use dataset::{Collection, ContentKind, Dataset, DatasetSpec, Exclusion, RecordId};
pub use network::Network;
pub use repair::{
	ProcessingFrontier, RepairQueue, PROCESSING_FRONTIER_ID, REPAIR_QUEUE_FIELD, REPAIR_QUEUE_ID,
};
