//! Metrics module for the reconciler.
//!
//! - This module contains the global Prometheus registry.
//! - Defines the counters updated by the reconciler and its orchestrators.

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, IntCounter, Opts, Registry, TextEncoder};

lazy_static! {
	/// Global Prometheus registry.
	///
	/// Holds every metric defined in this module and is gathered by
	/// [`gather_metrics`].
	pub static ref REGISTRY: Registry = Registry::new();

	/// Counter of heights checked, labelled by network.
	pub static ref HEIGHTS_CHECKED: CounterVec = {
		let counter = CounterVec::new(
			Opts::new("reconciler_heights_checked_total", "Heights checked against the block log"),
			&["network"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter of heights that failed reconciliation, labelled by network.
	pub static ref HEIGHTS_FAILED: CounterVec = {
		let counter = CounterVec::new(
			Opts::new("reconciler_heights_failed_total", "Heights whose derived data disagrees with the block log"),
			&["network"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter of heights newly added to the repair queue, labelled by network.
	pub static ref REPAIRS_ENQUEUED: CounterVec = {
		let counter = CounterVec::new(
			Opts::new("reconciler_repairs_enqueued_total", "Heights newly added to the repair queue"),
			&["network"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter of content mismatches, labelled by content kind.
	pub static ref CONTENT_MISMATCHES: CounterVec = {
		let counter = CounterVec::new(
			Opts::new("reconciler_content_mismatches_total", "Content kind mismatches between block log and datasets"),
			&["kind"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter of structural mismatches (block vs block log heights).
	pub static ref STRUCTURAL_MISMATCHES: IntCounter = {
		let counter = IntCounter::new(
			"reconciler_structural_mismatches_total",
			"Ranges where block heights and block log heights differ"
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter of sweep runs, labelled by network and outcome.
	pub static ref CLEANUP_RUNS: CounterVec = {
		let counter = CounterVec::new(
			Opts::new("reconciler_cleanup_runs_total", "Sweep runs by outcome"),
			&["network", "outcome"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};
}

/// Gather all metrics and encode them in the Prometheus text format.
pub fn gather_metrics() -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
	let encoder = TextEncoder::new();
	let metric_families = REGISTRY.gather();
	let mut buffer = Vec::new();
	encoder.encode(&metric_families, &mut buffer)?;
	Ok(buffer)
}
