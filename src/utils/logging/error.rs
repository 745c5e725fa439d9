//! Error context shared by every error type in the crate.
//!
//! Each subsystem error wraps an [`ErrorContext`] so that failures carry a
//! message, an optional source, free-form metadata, a timestamp and a trace id
//! that survives propagation through the reconciler.

use chrono::Utc;
use std::{collections::HashMap, fmt};
use uuid::Uuid;

/// Errors that expose the trace id of their context
pub trait TraceableError: std::error::Error + Send + Sync {
	/// Returns the trace id attached when the error was created
	fn trace_id(&self) -> String;
}

/// Context attached to an error
#[derive(Debug)]
pub struct ErrorContext {
	/// Human-readable message
	pub message: String,
	/// Underlying error, if any
	pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
	/// Additional key/value metadata (network, height, collection, ...)
	pub metadata: Option<HashMap<String, String>>,
	/// RFC 3339 timestamp of creation
	pub timestamp: String,
	/// Unique id used to correlate log lines
	pub trace_id: String,
}

impl ErrorContext {
	/// Creates a new context without logging it
	pub fn new(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self {
			message: message.into(),
			source,
			metadata,
			timestamp: Utc::now().to_rfc3339(),
			trace_id: Uuid::new_v4().to_string(),
		}
	}

	/// Creates a new context and logs it at error level
	pub fn new_with_log(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		let context = Self::new(message, source, metadata);
		log_error(&context);
		context
	}

	/// Adds a metadata entry
	pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.metadata
			.get_or_insert_with(HashMap::new)
			.insert(key.into(), value.into());
		self
	}

	/// Formats the message followed by the metadata sorted by key
	pub fn format_with_metadata(&self) -> String {
		match &self.metadata {
			Some(metadata) if !metadata.is_empty() => {
				let mut entries: Vec<_> = metadata.iter().collect();
				entries.sort();
				let rendered = entries
					.iter()
					.map(|(k, v)| format!("{}={}", k, v))
					.collect::<Vec<_>>()
					.join(", ");
				format!("{} [{}]", self.message, rendered)
			}
			_ => self.message.clone(),
		}
	}
}

impl fmt::Display for ErrorContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.format_with_metadata())
	}
}

fn log_error(context: &ErrorContext) {
	match &context.source {
		Some(source) => tracing::error!(
			trace_id = %context.trace_id,
			timestamp = %context.timestamp,
			source = %source,
			"{}",
			context.format_with_metadata()
		),
		None => tracing::error!(
			trace_id = %context.trace_id,
			timestamp = %context.timestamp,
			"{}",
			context.format_with_metadata()
		),
	}
}
