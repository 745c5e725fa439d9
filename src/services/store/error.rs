//! Document store error types
//!
//! Any failure reading from or writing to a store surfaces as a [`StoreError`].
//! Callers must abort the current check on these rather than treat the height
//! as healthy.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error;

/// Store error type
#[derive(Debug, Error)]
pub enum StoreError {
	/// A query or read could not be completed
	#[error("Store read failed: {0}")]
	ReadError(Box<ErrorContext>),

	/// A write could not be completed
	#[error("Store write failed: {0}")]
	WriteError(Box<ErrorContext>),

	/// Stored bytes could not be decoded
	#[error("Failed to parse stored data: {0}")]
	ParseError(Box<ErrorContext>),

	/// A document does not have the shape the reconciler relies on
	#[error("Invalid document: {0}")]
	InvalidDocument(Box<ErrorContext>),
}

impl StoreError {
	/// Creates a read error
	pub fn read_error(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ReadError(Box::new(ErrorContext::new_with_log(
			message, source, metadata,
		)))
	}

	/// Creates a write error
	pub fn write_error(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::WriteError(Box::new(ErrorContext::new_with_log(
			message, source, metadata,
		)))
	}

	/// Creates a parse error
	pub fn parse_error(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ParseError(Box::new(ErrorContext::new_with_log(
			message, source, metadata,
		)))
	}

	/// Creates an invalid document error
	pub fn invalid_document(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InvalidDocument(Box::new(ErrorContext::new_with_log(
			message, source, metadata,
		)))
	}

	fn context(&self) -> &ErrorContext {
		match self {
			StoreError::ReadError(context) => context,
			StoreError::WriteError(context) => context,
			StoreError::ParseError(context) => context,
			StoreError::InvalidDocument(context) => context,
		}
	}
}

impl TraceableError for StoreError {
	fn trace_id(&self) -> String {
		self.context().trace_id.clone()
	}
}
