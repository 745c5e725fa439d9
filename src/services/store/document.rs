//! Document store interface.
//!
//! The reconciler never talks to a concrete database: every read and write goes
//! through [`DocumentStore`], and one store handle exists per network.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::{
	models::Collection,
	services::store::{
		error::StoreError,
		filter::{compare_values, Filter, FindOptions},
	},
};

/// Interface for document store implementations
///
/// Every document carries an `_id`. Implementations must make
/// [`DocumentStore::add_to_set`] atomic with respect to concurrent callers,
/// including other store instances sharing the same backing storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
	/// Returns the documents of a collection matching the filter
	///
	/// # Arguments
	/// * `collection` - Collection to query
	/// * `filter` - Clauses every returned document satisfies
	/// * `options` - Sort, skip and limit
	///
	/// # Returns
	/// * `Result<Vec<Value>, StoreError>` - Matching documents, in unspecified
	///   order unless `options` requests a sort
	async fn find(
		&self,
		collection: Collection,
		filter: &Filter,
		options: &FindOptions,
	) -> Result<Vec<Value>, StoreError>;

	/// Returns the document whose `_id` equals `id`
	async fn find_one(
		&self,
		collection: Collection,
		id: &Value,
	) -> Result<Option<Value>, StoreError> {
		let filter = Filter::new().eq("_id", id.clone());
		let mut documents = self
			.find(collection, &filter, &FindOptions::default().limit(1))
			.await?;
		Ok(documents.pop())
	}

	/// Counts the documents of a collection matching the filter
	async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
		let documents = self
			.find(collection, filter, &FindOptions::default())
			.await?;
		Ok(documents.len() as u64)
	}

	/// Replaces the document with the same `_id`, inserting it if absent
	async fn replace_one(&self, collection: Collection, document: Value) -> Result<(), StoreError>;

	/// Adds `value` to the array `field` of document `id`
	///
	/// Creates the document (and the array) when absent and keeps the array
	/// sorted ascending.
	///
	/// # Returns
	/// * `Result<bool, StoreError>` - true if the value was not present before
	async fn add_to_set(
		&self,
		collection: Collection,
		id: &str,
		field: &str,
		value: Value,
	) -> Result<bool, StoreError>;
}

fn collection_metadata(collection: Collection) -> Option<HashMap<String, String>> {
	Some(HashMap::from([(
		"collection".to_string(),
		collection.name().to_string(),
	)]))
}

/// Upserts `document` into an in-memory collection, keyed by `_id`
pub(crate) fn replace_in(
	collection: Collection,
	documents: &mut Vec<Value>,
	document: Value,
) -> Result<(), StoreError> {
	let id = document.get("_id").cloned().ok_or_else(|| {
		StoreError::invalid_document(
			"Document has no _id",
			None,
			collection_metadata(collection),
		)
	})?;

	match documents
		.iter()
		.position(|existing| existing.get("_id") == Some(&id))
	{
		Some(index) => documents[index] = document,
		None => documents.push(document),
	}
	Ok(())
}

/// Adds `value` to the array `field` of document `id` in an in-memory collection
pub(crate) fn add_to_set_in(
	collection: Collection,
	documents: &mut Vec<Value>,
	id: &str,
	field: &str,
	value: Value,
) -> Result<bool, StoreError> {
	let index = match documents
		.iter()
		.position(|existing| existing.get("_id").and_then(Value::as_str) == Some(id))
	{
		Some(index) => index,
		None => {
			documents.push(serde_json::json!({ "_id": id }));
			documents.len() - 1
		}
	};

	let invalid = |reason: &str| {
		let mut metadata = collection_metadata(collection).unwrap_or_default();
		metadata.insert("_id".to_string(), id.to_string());
		metadata.insert("field".to_string(), field.to_string());
		StoreError::invalid_document(reason.to_string(), None, Some(metadata))
	};

	let entry = documents[index]
		.as_object_mut()
		.ok_or_else(|| invalid("Document is not an object"))?
		.entry(field.to_string())
		.or_insert_with(|| Value::Array(Vec::new()));

	let values = entry
		.as_array_mut()
		.ok_or_else(|| invalid("Field is not an array"))?;

	if values.contains(&value) {
		return Ok(false);
	}
	values.push(value);
	values.sort_by(compare_values);
	Ok(true)
}
