//! Document store access.
//!
//! This module provides everything the reconciler needs from the indexer's
//! store:
//! - The `DocumentStore` interface and its query model
//! - In-memory and file-based store implementations
//! - Error handling for store operations
//! - The range query layer over the block log and derived datasets

mod document;
mod error;
mod file;
mod filter;
mod memory;
mod queries;

pub use document::DocumentStore;
pub use error::StoreError;
pub use file::FileDocumentStore;
pub use filter::{compare_values, field_value, Filter, FindOptions};
pub use memory::MemoryDocumentStore;
pub use queries::{
	actual_content_ids, block_heights_in_range, count_matching_ids, expected_content_ids,
	heights_with_logged_content, log_heights_in_range, processing_frontier,
};
