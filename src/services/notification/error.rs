//! Notification error types

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error;

/// Notification error type
#[derive(Debug, Error)]
pub enum NotificationError {
	/// The message could not be delivered
	#[error("Notification request failed: {0}")]
	RequestError(Box<ErrorContext>),

	/// The notifier is misconfigured
	#[error("Notification config error: {0}")]
	ConfigError(Box<ErrorContext>),
}

impl NotificationError {
	/// Creates a request error
	pub fn request_error(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::RequestError(Box::new(ErrorContext::new_with_log(
			message, source, metadata,
		)))
	}

	/// Creates a config error
	pub fn config_error(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConfigError(Box::new(ErrorContext::new_with_log(
			message, source, metadata,
		)))
	}
}

impl TraceableError for NotificationError {
	fn trace_id(&self) -> String {
		match self {
			Self::RequestError(ctx) => ctx.trace_id.clone(),
			Self::ConfigError(ctx) => ctx.trace_id.clone(),
		}
	}
}
