//! Run orchestrators.
//!
//! Two entry points built on [`check_range`] and the repair queue:
//! - [`Reconciler::lookup_block`] checks one height on demand
//! - [`Reconciler::cleanup`] sweeps the window below the processing frontier

use std::{
	collections::{BTreeMap, HashMap},
	sync::Arc,
};
use tracing::instrument;

use crate::{
	models::{Network, DEFAULT_CLEANUP_WINDOW},
	services::{
		notification::Notifier,
		reconciler::{
			check::{check_range, CheckOutcome, Violation},
			error::ReconcilerError,
			repair::request_repair,
		},
		store::{processing_frontier, DocumentStore},
	},
	utils::metrics::{CLEANUP_RUNS, HEIGHTS_CHECKED, HEIGHTS_FAILED},
};

/// Store handle and sweep window of one network
#[derive(Debug)]
pub struct NetworkStore<S: ?Sized> {
	pub store: Arc<S>,
	/// Number of heights below the frontier covered by one sweep
	pub window: u64,
}

impl<S: ?Sized> Clone for NetworkStore<S> {
	fn clone(&self) -> Self {
		Self {
			store: self.store.clone(),
			window: self.window,
		}
	}
}

/// Per-network store handles
///
/// Mainnet and testnet never share a store; every operation receives the
/// handle of the network it targets.
#[derive(Debug)]
pub struct NetworkStores<S: ?Sized> {
	stores: BTreeMap<Network, NetworkStore<S>>,
}

impl<S: ?Sized> Default for NetworkStores<S> {
	fn default() -> Self {
		Self {
			stores: BTreeMap::new(),
		}
	}
}

impl<S: ?Sized> Clone for NetworkStores<S> {
	fn clone(&self) -> Self {
		Self {
			stores: self.stores.clone(),
		}
	}
}

impl<S: ?Sized> NetworkStores<S> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers the store of a network with the default sweep window
	pub fn with_store(self, network: Network, store: Arc<S>) -> Self {
		self.with_store_and_window(network, store, DEFAULT_CLEANUP_WINDOW)
	}

	/// Registers the store of a network with a custom sweep window
	pub fn with_store_and_window(mut self, network: Network, store: Arc<S>, window: u64) -> Self {
		self.stores.insert(network, NetworkStore { store, window });
		self
	}

	pub fn get(&self, network: Network) -> Option<&NetworkStore<S>> {
		self.stores.get(&network)
	}

	/// Registered networks, in a stable order
	pub fn networks(&self) -> Vec<Network> {
		self.stores.keys().copied().collect()
	}
}

/// Result of an on-demand height check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResult {
	pub height: u64,
	pub ok: bool,
	/// Violations found at the height, including advisory ones
	pub reasons: Vec<Violation>,
	/// True if the height was added to the repair queue by this check
	pub newly_queued: bool,
}

/// Result of a sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupResult {
	/// First height of the window
	pub start: u64,
	/// Processing frontier; last height of the window
	pub stop: u64,
	/// Outcome of the coarse check at `start`
	pub coarse_ok: bool,
	/// Heights checked individually after a failed coarse check
	pub scanned: u64,
	/// Heights that failed individually, ascending
	pub failed: Vec<u64>,
	/// Failed heights that were not queued before
	pub enqueued: usize,
}

/// Runs reconciliation for the configured networks
///
/// # Type Parameters
/// * `S` - Document store implementation
/// * `N` - Notification channel implementation
pub struct Reconciler<S: ?Sized, N: ?Sized> {
	stores: NetworkStores<S>,
	notifier: Arc<N>,
}

impl<S, N> Reconciler<S, N>
where
	S: DocumentStore + ?Sized,
	N: Notifier + ?Sized,
{
	/// Creates a new reconciler
	///
	/// # Arguments
	/// * `stores` - Store handles of every network to reconcile
	/// * `notifier` - Channel announcing repairs
	pub fn new(stores: NetworkStores<S>, notifier: Arc<N>) -> Self {
		Self { stores, notifier }
	}

	/// Overrides the sweep window of a registered network
	pub fn with_cleanup_window(mut self, network: Network, window: u64) -> Self {
		if let Some(entry) = self.stores.stores.get_mut(&network) {
			entry.window = window;
		}
		self
	}

	pub fn networks(&self) -> Vec<Network> {
		self.stores.networks()
	}

	fn network_store(&self, network: Network) -> Result<&NetworkStore<S>, ReconcilerError> {
		self.stores.get(network).ok_or_else(|| {
			ReconcilerError::unknown_network(
				format!("No store registered for {}", network),
				None,
				Some(HashMap::from([(
					"network".to_string(),
					network.to_string(),
				)])),
			)
		})
	}

	/// Checks a single height and requests its repair if it fails
	async fn check_height(
		&self,
		network: Network,
		store: &S,
		height: u64,
	) -> Result<(CheckOutcome, bool), ReconcilerError> {
		let outcome = check_range(store, height, height.saturating_add(1)).await?;
		HEIGHTS_CHECKED
			.with_label_values(&[network.as_str()])
			.inc();

		if outcome.ok {
			return Ok((outcome, false));
		}

		HEIGHTS_FAILED
			.with_label_values(&[network.as_str()])
			.inc();
		let newly_queued = request_repair(
			store,
			self.notifier.as_ref(),
			network,
			height,
			&outcome.reason_strings(height),
		)
		.await?;
		Ok((outcome, newly_queued))
	}

	/// Checks one height on demand
	///
	/// A failing height is added to the repair queue and announced.
	#[instrument(skip(self), fields(network = %network))]
	pub async fn lookup_block(
		&self,
		network: Network,
		height: u64,
	) -> Result<LookupResult, ReconcilerError> {
		tracing::info!("Running lookup for block {}", height);
		let store = self.network_store(network)?.store.clone();
		let (outcome, newly_queued) = self.check_height(network, &store, height).await?;

		Ok(LookupResult {
			height,
			ok: outcome.ok,
			reasons: outcome.reasons_at(height).to_vec(),
			newly_queued,
		})
	}

	/// Sweeps the window below the processing frontier
	///
	/// One coarse check runs first. Only when it fails is every height of
	/// `[frontier - window, frontier]` checked individually, and each failing
	/// height queued for repair. A store error aborts the sweep.
	#[instrument(skip(self), fields(network = %network))]
	pub async fn cleanup(&self, network: Network) -> Result<CleanupResult, ReconcilerError> {
		let result = self.run_cleanup(network).await;
		let outcome = match &result {
			Ok(r) if r.coarse_ok => "healthy",
			Ok(r) if r.failed.is_empty() => "resolved",
			Ok(_) => "repairs_requested",
			Err(_) => "error",
		};
		CLEANUP_RUNS
			.with_label_values(&[network.as_str(), outcome])
			.inc();
		result
	}

	async fn run_cleanup(&self, network: Network) -> Result<CleanupResult, ReconcilerError> {
		let NetworkStore { store, window } = self.network_store(network)?.clone();

		let stop = processing_frontier(store.as_ref()).await?.ok_or_else(|| {
			ReconcilerError::frontier_missing(
				"No processing frontier recorded",
				None,
				Some(HashMap::from([(
					"network".to_string(),
					network.to_string(),
				)])),
			)
		})?;
		let start = stop.saturating_sub(window);

		tracing::info!(
			start,
			stop,
			"Running cleanup for {} for {}-{}",
			network,
			start,
			stop
		);

		let coarse = check_range(store.as_ref(), start, stop).await?;
		let mut result = CleanupResult {
			start,
			stop,
			coarse_ok: coarse.ok,
			..Default::default()
		};

		if coarse.ok {
			tracing::info!(start, stop, "Cleanup found no inconsistencies");
			return Ok(result);
		}

		tracing::warn!(
			start,
			stop,
			reasons = ?coarse.reason_strings(start),
			"Coarse check failed, checking every height"
		);

		for height in start..=stop {
			let (outcome, newly_queued) = self.check_height(network, &store, height).await?;
			result.scanned += 1;
			if !outcome.ok {
				result.failed.push(height);
				if newly_queued {
					result.enqueued += 1;
				}
			}
		}

		tracing::info!(
			start,
			stop,
			failed = result.failed.len(),
			enqueued = result.enqueued,
			"Cleanup done"
		);
		Ok(result)
	}

	/// Sweeps every registered network
	///
	/// A failing network is logged and does not prevent the others from being
	/// swept.
	pub async fn cleanup_all(&self) -> Vec<(Network, Result<CleanupResult, ReconcilerError>)> {
		let mut results = Vec::new();
		for network in self.networks() {
			let result = self.cleanup(network).await;
			if let Err(e) = &result {
				tracing::error!(%network, error = %e, "Cleanup failed");
			}
			results.push((network, result));
		}
		results
	}
}

impl<S: ?Sized, N: ?Sized> Clone for Reconciler<S, N> {
	fn clone(&self) -> Self {
		Self {
			stores: self.stores.clone(),
			notifier: self.notifier.clone(),
		}
	}
}
