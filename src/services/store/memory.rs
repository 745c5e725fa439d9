//! In-memory document store.
//!
//! Keeps every collection behind a single `RwLock`. Used by tests and by
//! callers that load a snapshot of the indexer collections themselves.

use async_trait::async_trait;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use crate::{
	models::Collection,
	services::store::{
		document::{add_to_set_in, replace_in, DocumentStore},
		error::StoreError,
		filter::{Filter, FindOptions},
	},
};

/// Document store held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
	collections: Arc<RwLock<HashMap<Collection, Vec<Value>>>>,
}

impl MemoryDocumentStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends documents to a collection without checking `_id` uniqueness
	pub async fn insert_many(&self, collection: Collection, documents: impl IntoIterator<Item = Value>) {
		self.collections
			.write()
			.await
			.entry(collection)
			.or_default()
			.extend(documents);
	}
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
	async fn find(
		&self,
		collection: Collection,
		filter: &Filter,
		options: &FindOptions,
	) -> Result<Vec<Value>, StoreError> {
		let collections = self.collections.read().await;
		let matching: Vec<Value> = collections
			.get(&collection)
			.map(|documents| {
				documents
					.iter()
					.filter(|document| filter.matches(document))
					.cloned()
					.collect()
			})
			.unwrap_or_default();
		Ok(options.apply(matching))
	}

	async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
		let collections = self.collections.read().await;
		Ok(collections.get(&collection).map_or(0, |documents| {
			documents
				.iter()
				.filter(|document| filter.matches(document))
				.count() as u64
		}))
	}

	async fn replace_one(&self, collection: Collection, document: Value) -> Result<(), StoreError> {
		let mut collections = self.collections.write().await;
		replace_in(collection, collections.entry(collection).or_default(), document)
	}

	async fn add_to_set(
		&self,
		collection: Collection,
		id: &str,
		field: &str,
		value: Value,
	) -> Result<bool, StoreError> {
		let mut collections = self.collections.write().await;
		add_to_set_in(
			collection,
			collections.entry(collection).or_default(),
			id,
			field,
			value,
		)
	}
}
