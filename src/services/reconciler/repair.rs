//! Repair queue management.
//!
//! Failing heights are added to the repair queue helper record with the
//! store's atomic set insertion, so concurrent sweeps and on-demand checks on
//! the same network never lose each other's entries. An external worker
//! consumes the queue.

use serde_json::Value;
use std::collections::HashMap;

use crate::{
	models::{Collection, Network, RepairQueue, REPAIR_QUEUE_FIELD, REPAIR_QUEUE_ID},
	services::{
		notification::Notifier,
		reconciler::error::ReconcilerError,
		store::{DocumentStore, StoreError},
	},
	utils::metrics::REPAIRS_ENQUEUED,
};

/// Adds `height` to the repair queue
///
/// Idempotent: enqueuing a queued height leaves the queue unchanged.
///
/// # Returns
/// * `Result<bool, ReconcilerError>` - true if the height was not queued before
pub async fn enqueue_repair<S: DocumentStore + ?Sized>(
	store: &S,
	height: u64,
) -> Result<bool, ReconcilerError> {
	let inserted = store
		.add_to_set(
			Collection::Helpers,
			REPAIR_QUEUE_ID,
			REPAIR_QUEUE_FIELD,
			Value::from(height),
		)
		.await?;
	Ok(inserted)
}

/// Reads the repair queue; an absent record is an empty queue
pub async fn read_repair_queue<S: DocumentStore + ?Sized>(
	store: &S,
) -> Result<RepairQueue, ReconcilerError> {
	let Some(document) = store
		.find_one(Collection::Helpers, &Value::from(REPAIR_QUEUE_ID))
		.await?
	else {
		return Ok(RepairQueue::new());
	};

	let queue: RepairQueue = serde_json::from_value(document).map_err(|e| {
		StoreError::parse_error(
			"Failed to parse repair queue",
			Some(e.into()),
			Some(HashMap::from([(
				"_id".to_string(),
				REPAIR_QUEUE_ID.to_string(),
			)])),
		)
	})?;
	Ok(queue)
}

/// Formats a height with thousands separators
pub fn format_height(height: u64) -> String {
	let digits = height.to_string();
	let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
	for (i, c) in digits.chars().enumerate() {
		if i > 0 && (digits.len() - i) % 3 == 0 {
			formatted.push(',');
		}
		formatted.push(c);
	}
	formatted
}

/// Quotes one entry of the reason list in repair messages
///
/// Single quotes, switching to double quotes when the text holds a single
/// quote and no double quote.
fn quote_reason(reason: &str) -> String {
	if reason.contains('\'') && !reason.contains('"') {
		format!("\"{}\"", reason.replace('\\', "\\\\"))
	} else {
		format!(
			"'{}'",
			reason.replace('\\', "\\\\").replace('\'', "\\'")
		)
	}
}

/// Message announcing that a height is queued for repair
///
/// Reasons render as a quoted list: `['a', 'b']`.
pub fn repair_message(network: Network, height: u64, reasons: &[String]) -> String {
	let quoted: Vec<String> = reasons.iter().map(|r| quote_reason(r)).collect();
	format!(
		"{}: Repairing block {}. Reasons: [{}]",
		network,
		format_height(height),
		quoted.join(", ")
	)
}

/// Queues `height` for repair, then announces it
///
/// The queue is written before the notification is sent. A failed
/// notification is logged and does not fail the request.
///
/// # Returns
/// * `Result<bool, ReconcilerError>` - true if the height was newly queued
pub async fn request_repair<S: DocumentStore + ?Sized, N: Notifier + ?Sized>(
	store: &S,
	notifier: &N,
	network: Network,
	height: u64,
	reasons: &[String],
) -> Result<bool, ReconcilerError> {
	let newly_queued = enqueue_repair(store, height).await?;
	if newly_queued {
		REPAIRS_ENQUEUED
			.with_label_values(&[network.as_str()])
			.inc();
	}

	let message = repair_message(network, height, reasons);
	tracing::info!(%network, height, newly_queued, "{}", message);

	if let Err(e) = notifier.notify(&message).await {
		tracing::warn!(%network, height, error = %e, "Failed to send repair notification");
	}

	Ok(newly_queued)
}
