//! Reconciler error types
//!
//! Only I/O and setup failures are errors. Inconsistencies found while
//! reconciling are returned as data (see [`Violation`](super::Violation)).

use crate::{
	services::store::StoreError,
	utils::logging::error::{ErrorContext, TraceableError},
};
use std::collections::HashMap;
use thiserror::Error;

/// Reconciler error type
#[derive(Debug, Error)]
pub enum ReconcilerError {
	/// A store query or write failed; the current check was aborted
	#[error("Store unavailable: {0}")]
	StoreUnavailable(Box<ErrorContext>),

	/// The processing frontier helper record is absent
	#[error("Processing frontier missing: {0}")]
	FrontierMissing(Box<ErrorContext>),

	/// No store is registered for the network
	#[error("Unknown network: {0}")]
	UnknownNetwork(Box<ErrorContext>),

	/// The cleanup scheduler failed
	#[error("Scheduler error: {0}")]
	SchedulerError(Box<ErrorContext>),
}

impl ReconcilerError {
	/// Creates a frontier missing error
	pub fn frontier_missing(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::FrontierMissing(Box::new(ErrorContext::new_with_log(
			message, source, metadata,
		)))
	}

	/// Creates an unknown network error
	pub fn unknown_network(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::UnknownNetwork(Box::new(ErrorContext::new_with_log(
			message, source, metadata,
		)))
	}

	/// Creates a scheduler error
	pub fn scheduler_error(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::SchedulerError(Box::new(ErrorContext::new_with_log(
			message, source, metadata,
		)))
	}
}

impl TraceableError for ReconcilerError {
	fn trace_id(&self) -> String {
		match self {
			Self::StoreUnavailable(ctx) => ctx.trace_id.clone(),
			Self::FrontierMissing(ctx) => ctx.trace_id.clone(),
			Self::UnknownNetwork(ctx) => ctx.trace_id.clone(),
			Self::SchedulerError(ctx) => ctx.trace_id.clone(),
		}
	}
}

// The store error has already been logged when it was created
impl From<StoreError> for ReconcilerError {
	fn from(error: StoreError) -> Self {
		Self::StoreUnavailable(Box::new(ErrorContext::new(
			error.to_string(),
			Some(Box::new(error)),
			None,
		)))
	}
}
