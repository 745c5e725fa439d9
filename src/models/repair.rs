//! Helper records: the repair queue and the processing frontier.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// `_id` of the helper document holding the highest fully processed height
pub const PROCESSING_FRONTIER_ID: &str = "heartbeat_last_processed_block";

/// `_id` of the helper document holding the heights awaiting reprocessing
pub const REPAIR_QUEUE_ID: &str = "special_purpose_block_request";

/// Field of the repair queue document holding the heights
pub const REPAIR_QUEUE_FIELD: &str = "heights";

/// Set of heights awaiting reprocessing by the external repair worker
///
/// Serialized as `{"_id": "special_purpose_block_request", "heights": [..]}`
/// with the heights sorted and free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairQueue {
	#[serde(rename = "_id", default = "repair_queue_id")]
	pub id: String,
	#[serde(default)]
	pub heights: BTreeSet<u64>,
}

fn repair_queue_id() -> String {
	REPAIR_QUEUE_ID.to_string()
}

impl RepairQueue {
	/// Creates an empty queue
	pub fn new() -> Self {
		Self {
			id: repair_queue_id(),
			heights: BTreeSet::new(),
		}
	}

	/// Returns true if the height is queued
	pub fn contains(&self, height: u64) -> bool {
		self.heights.contains(&height)
	}

	pub fn len(&self) -> usize {
		self.heights.len()
	}

	pub fn is_empty(&self) -> bool {
		self.heights.is_empty()
	}
}

impl FromIterator<u64> for RepairQueue {
	fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
		Self {
			id: repair_queue_id(),
			heights: iter.into_iter().collect(),
		}
	}
}

/// Highest height fully processed by the external pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingFrontier {
	pub height: u64,
}
