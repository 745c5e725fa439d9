//! Range query layer.
//!
//! Read-only queries against the block log and the derived datasets, each
//! restricted to a single height or a closed-open height interval. Every
//! result is sorted ascending regardless of the store's native ordering.

use serde_json::Value;
use std::collections::HashMap;

use crate::{
	models::{
		Collection, ContentKind, Dataset, ProcessingFrontier, RecordId, PROCESSING_FRONTIER_ID,
	},
	services::store::{
		document::DocumentStore,
		error::StoreError,
		filter::{Filter, FindOptions},
	},
};

fn height_metadata(collection: Collection, height: u64) -> Option<HashMap<String, String>> {
	Some(HashMap::from([
		("collection".to_string(), collection.name().to_string()),
		("height".to_string(), height.to_string()),
	]))
}

/// Collects an integer field from every document, sorted ascending
///
/// A document without a usable height is an error rather than a gap.
fn sorted_heights(
	documents: &[Value],
	collection: Collection,
	field: &str,
) -> Result<Vec<u64>, StoreError> {
	let mut heights = documents
		.iter()
		.map(|document| {
			document.get(field).and_then(Value::as_u64).ok_or_else(|| {
				let mut metadata = HashMap::from([
					("collection".to_string(), collection.name().to_string()),
					("field".to_string(), field.to_string()),
				]);
				if let Some(id) = document.get("_id") {
					metadata.insert("_id".to_string(), id.to_string());
				}
				StoreError::invalid_document("Document has no integer height", None, Some(metadata))
			})
		})
		.collect::<Result<Vec<_>, _>>()?;
	heights.sort_unstable();
	Ok(heights)
}

/// Heights of block log entries recording content of `kind`, paginated
///
/// Intended for inspection, not for the reconciliation path.
pub async fn heights_with_logged_content<S: DocumentStore + ?Sized>(
	store: &S,
	kind: ContentKind,
	skip: usize,
	limit: usize,
) -> Result<Vec<u64>, StoreError> {
	let documents = store
		.find(
			Collection::BlocksLog,
			&Filter::new().exists(kind.log_field()),
			&FindOptions::default().sort("_id").skip(skip).limit(limit),
		)
		.await?;
	sorted_heights(&documents, Collection::BlocksLog, "_id")
}

/// Heights present in `blocks` within `[start, stop)`
pub async fn block_heights_in_range<S: DocumentStore + ?Sized>(
	store: &S,
	start: u64,
	stop: u64,
) -> Result<Vec<u64>, StoreError> {
	let documents = store
		.find(
			Collection::Blocks,
			&Filter::new().range("height", start, stop),
			&FindOptions::default(),
		)
		.await?;
	sorted_heights(&documents, Collection::Blocks, "height")
}

/// Heights present in `blocks_log` within `[start, stop)`
pub async fn log_heights_in_range<S: DocumentStore + ?Sized>(
	store: &S,
	start: u64,
	stop: u64,
) -> Result<Vec<u64>, StoreError> {
	let documents = store
		.find(
			Collection::BlocksLog,
			&Filter::new().range("_id", start, stop),
			&FindOptions::default(),
		)
		.await?;
	sorted_heights(&documents, Collection::BlocksLog, "_id")
}

/// Identifiers the block log claims exist for `kind` at `height`
///
/// An absent log entry or an absent list field yields an empty list.
pub async fn expected_content_ids<S: DocumentStore + ?Sized>(
	store: &S,
	height: u64,
	kind: ContentKind,
) -> Result<Vec<RecordId>, StoreError> {
	let Some(entry) = store
		.find_one(Collection::BlocksLog, &Value::from(height))
		.await?
	else {
		return Ok(Vec::new());
	};

	let invalid = |reason: &str| {
		let mut metadata = height_metadata(Collection::BlocksLog, height).unwrap_or_default();
		metadata.insert("field".to_string(), kind.log_field().to_string());
		StoreError::invalid_document(reason.to_string(), None, Some(metadata))
	};

	let mut ids = match entry.get(kind.log_field()) {
		None | Some(Value::Null) => Vec::new(),
		Some(Value::Array(values)) => values
			.iter()
			.map(|value| RecordId::from_value(value).ok_or_else(|| invalid("Unsupported identifier")))
			.collect::<Result<Vec<_>, _>>()?,
		Some(_) => return Err(invalid("Logged content is not a list")),
	};
	ids.sort();
	Ok(ids)
}

/// Identifiers of `dataset` records linked to `height`, after the dataset's exclusion
pub async fn actual_content_ids<S: DocumentStore + ?Sized>(
	store: &S,
	height: u64,
	dataset: Dataset,
) -> Result<Vec<RecordId>, StoreError> {
	let spec = dataset.spec();
	let mut filter = Filter::new().eq(spec.link_field, height);
	if let Some(exclusion) = spec.exclusion {
		filter = filter.ne(exclusion.field, exclusion.value);
	}

	let documents = store
		.find(spec.collection, &filter, &FindOptions::default())
		.await?;

	let mut ids = documents
		.iter()
		.map(|document| {
			document
				.get("_id")
				.and_then(RecordId::from_value)
				.ok_or_else(|| {
					StoreError::invalid_document(
						"Record has no usable _id",
						None,
						height_metadata(spec.collection, height),
					)
				})
		})
		.collect::<Result<Vec<_>, _>>()?;
	ids.sort();
	Ok(ids)
}

/// Number of `dataset` records whose identifier is one of `ids`, wherever linked
///
/// Returns 0 for an empty list without querying the store.
pub async fn count_matching_ids<S: DocumentStore + ?Sized>(
	store: &S,
	ids: &[RecordId],
	dataset: Dataset,
) -> Result<u64, StoreError> {
	if ids.is_empty() {
		return Ok(0);
	}
	let filter = Filter::new().is_in("_id", ids.iter().map(RecordId::to_value).collect());
	store.count(dataset.spec().collection, &filter).await
}

/// Highest height fully processed by the pipeline, if recorded
pub async fn processing_frontier<S: DocumentStore + ?Sized>(
	store: &S,
) -> Result<Option<u64>, StoreError> {
	let Some(document) = store
		.find_one(Collection::Helpers, &Value::from(PROCESSING_FRONTIER_ID))
		.await?
	else {
		return Ok(None);
	};

	let frontier: ProcessingFrontier = serde_json::from_value(document).map_err(|e| {
		StoreError::invalid_document(
			"Processing frontier has no height",
			Some(e.into()),
			Some(HashMap::from([(
				"_id".to_string(),
				PROCESSING_FRONTIER_ID.to_string(),
			)])),
		)
	})?;
	Ok(Some(frontier.height))
}
