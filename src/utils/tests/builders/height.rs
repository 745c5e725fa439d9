//! Test helper utilities for indexer store contents
//!
//! - `HeightFixtureBuilder`: Builder for the documents the producer and its
//!   consumers write for one height
//! - `seed_frontier`: Writes the processing frontier helper record

use serde_json::{json, Value};

use crate::{
	models::{Collection, Dataset, RecordId, PROCESSING_FRONTIER_ID},
	services::store::{DocumentStore, StoreError},
};

/// Documents describing a single height across every collection
#[derive(Debug, Clone, PartialEq)]
pub struct HeightFixture {
	pub height: u64,
	pub documents: Vec<(Collection, Value)>,
}

impl HeightFixture {
	/// Upserts every document into the store
	pub async fn seed<S: DocumentStore + ?Sized>(&self, store: &S) -> Result<(), StoreError> {
		for (collection, document) in &self.documents {
			store.replace_one(*collection, document.clone()).await?;
		}
		Ok(())
	}
}

/// A builder for a consistent height, with knobs to break it.
///
/// By default the height has a block, a block log entry without content and
/// its special event.
#[derive(Debug, Clone)]
pub struct HeightFixtureBuilder {
	height: u64,
	transactions: Vec<String>,
	impacted_addresses: Vec<String>,
	logged_events: Vec<String>,
	transfers: Vec<String>,
	account_rewards: Vec<String>,
	dropped: Vec<(Dataset, RecordId)>,
	block: bool,
	block_log: bool,
	special_event: bool,
}

impl Default for HeightFixtureBuilder {
	fn default() -> Self {
		Self {
			height: 100,
			transactions: Vec::new(),
			impacted_addresses: Vec::new(),
			logged_events: Vec::new(),
			transfers: Vec::new(),
			account_rewards: Vec::new(),
			dropped: Vec::new(),
			block: true,
			block_log: true,
			special_event: true,
		}
	}
}

fn owned(ids: &[&str]) -> Vec<String> {
	ids.iter().map(|id| id.to_string()).collect()
}

impl HeightFixtureBuilder {
	/// Creates a new HeightFixtureBuilder instance.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the height.
	pub fn height(mut self, height: u64) -> Self {
		self.height = height;
		self
	}

	/// Sets the logged and stored transaction hashes.
	pub fn transactions(mut self, ids: &[&str]) -> Self {
		self.transactions = owned(ids);
		self
	}

	/// Sets the logged and stored impacted address ids.
	pub fn impacted_addresses(mut self, ids: &[&str]) -> Self {
		self.impacted_addresses = owned(ids);
		self
	}

	/// Sets the logged and stored token event ids.
	pub fn logged_events(mut self, ids: &[&str]) -> Self {
		self.logged_events = owned(ids);
		self
	}

	/// Sets the logged and stored transfer ids.
	pub fn transfers(mut self, ids: &[&str]) -> Self {
		self.transfers = owned(ids);
		self
	}

	/// Adds a stored "Account Reward" impacted address that is never logged.
	pub fn account_reward(mut self, id: &str) -> Self {
		self.account_rewards.push(id.to_string());
		self
	}

	/// Keeps `id` in the block log but drops the derived record.
	pub fn drop_record(mut self, dataset: Dataset, id: impl Into<RecordId>) -> Self {
		self.dropped.push((dataset, id.into()));
		self
	}

	/// Omits the special event record.
	pub fn without_special_event(mut self) -> Self {
		self.special_event = false;
		self
	}

	/// Omits the block log entry.
	pub fn without_block_log(mut self) -> Self {
		self.block_log = false;
		self
	}

	/// Omits the block record.
	pub fn without_block(mut self) -> Self {
		self.block = false;
		self
	}

	fn is_dropped(&self, dataset: Dataset, id: &str) -> bool {
		self.dropped
			.iter()
			.any(|(d, dropped)| *d == dataset && *dropped == RecordId::from(id))
	}

	/// Builds the HeightFixture instance.
	pub fn build(self) -> HeightFixture {
		let height = self.height;
		let mut documents = Vec::new();

		if self.block {
			documents.push((
				Collection::Blocks,
				json!({"_id": format!("block-{}", height), "height": height}),
			));
		}

		if self.block_log {
			let mut entry = json!({ "_id": height });
			let lists = [
				(Dataset::Transactions, &self.transactions),
				(Dataset::ImpactedAddresses, &self.impacted_addresses),
				(Dataset::TokensLoggedEvents, &self.logged_events),
				(Dataset::InvolvedAccountsTransfer, &self.transfers),
			];
			for (dataset, ids) in lists {
				if let (Some(kind), false) = (dataset.content_kind(), ids.is_empty()) {
					entry[kind.log_field()] = json!(ids);
				}
			}
			documents.push((Collection::BlocksLog, entry));
		}

		for id in &self.transactions {
			if !self.is_dropped(Dataset::Transactions, id) {
				documents.push((
					Collection::Transactions,
					json!({"_id": id, "block_info": {"height": height}}),
				));
			}
		}
		for id in &self.impacted_addresses {
			if !self.is_dropped(Dataset::ImpactedAddresses, id) {
				documents.push((
					Collection::ImpactedAddresses,
					json!({"_id": id, "block_height": height, "effect_type": "Account Transfer"}),
				));
			}
		}
		for id in &self.account_rewards {
			documents.push((
				Collection::ImpactedAddresses,
				json!({"_id": id, "block_height": height, "effect_type": "Account Reward"}),
			));
		}
		for id in &self.logged_events {
			if !self.is_dropped(Dataset::TokensLoggedEvents, id) {
				documents.push((
					Collection::TokensLoggedEvents,
					json!({"_id": id, "block_height": height}),
				));
			}
		}
		for id in &self.transfers {
			if !self.is_dropped(Dataset::InvolvedAccountsTransfer, id) {
				documents.push((
					Collection::InvolvedAccountsTransfer,
					json!({"_id": id, "block_height": height}),
				));
			}
		}

		if self.special_event {
			documents.push((Collection::SpecialEvents, json!({ "_id": height })));
		}

		HeightFixture { height, documents }
	}
}

/// Records `height` as the highest fully processed height
pub async fn seed_frontier<S: DocumentStore + ?Sized>(
	store: &S,
	height: u64,
) -> Result<(), StoreError> {
	store
		.replace_one(
			Collection::Helpers,
			json!({"_id": PROCESSING_FRONTIER_ID, "height": height}),
		)
		.await
}

/// Seeds consistent heights `start..stop` with one transaction each
pub async fn seed_consistent_range<S: DocumentStore + ?Sized>(
	store: &S,
	start: u64,
	stop: u64,
) -> Result<(), StoreError> {
	for height in start..stop {
		let tx = format!("tx-{}", height);
		HeightFixtureBuilder::new()
			.height(height)
			.transactions(&[tx.as_str()])
			.build()
			.seed(store)
			.await?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_fixture() {
		let fixture = HeightFixtureBuilder::new().height(7).build();
		assert_eq!(
			fixture.documents,
			vec![
				(Collection::Blocks, json!({"_id": "block-7", "height": 7})),
				(Collection::BlocksLog, json!({"_id": 7})),
				(Collection::SpecialEvents, json!({"_id": 7})),
			]
		);
	}

	#[test]
	fn test_dropped_record_stays_logged() {
		let fixture = HeightFixtureBuilder::new()
			.height(50)
			.transactions(&["a", "b"])
			.drop_record(Dataset::Transactions, "b")
			.without_special_event()
			.build();

		let log = fixture
			.documents
			.iter()
			.find(|(c, _)| *c == Collection::BlocksLog)
			.map(|(_, d)| d.clone())
			.unwrap();
		assert_eq!(log["transaction_hashes"], json!(["a", "b"]));

		let stored: Vec<_> = fixture
			.documents
			.iter()
			.filter(|(c, _)| *c == Collection::Transactions)
			.collect();
		assert_eq!(stored.len(), 1);
		assert!(!fixture
			.documents
			.iter()
			.any(|(c, _)| *c == Collection::SpecialEvents));
	}
}
