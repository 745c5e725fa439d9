//! Scheduled sweeps.
//!
//! Registers one cron job per network with cleanup enabled. Each run calls
//! [`Reconciler::cleanup`] for its network.

use std::{collections::HashMap, sync::Arc};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::{
	models::{CleanupConfig, Network, NetworkConfig},
	services::{
		notification::Notifier,
		reconciler::{error::ReconcilerError, orchestrator::Reconciler},
		store::DocumentStore,
	},
};

/// Trait for job scheduler
///
/// This trait is used to abstract the job scheduler implementation so that
/// the cleanup scheduler can be tested without running cron jobs.
#[async_trait::async_trait]
pub trait JobSchedulerTrait: Send + Sync + Sized {
	async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>>;
	async fn add(&self, job: Job) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
	async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
	async fn shutdown(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Implementation of the job scheduler trait for the JobScheduler struct
#[async_trait::async_trait]
impl JobSchedulerTrait for JobScheduler {
	async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
		Self::new().await.map_err(Into::into)
	}

	async fn add(&self, job: Job) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
		self.add(job).await.map(|_| ()).map_err(Into::into)
	}

	async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
		self.start().await.map(|_| ()).map_err(Into::into)
	}

	async fn shutdown(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
		self.shutdown().await.map(|_| ()).map_err(Into::into)
	}
}

fn network_metadata(network: Network) -> Option<HashMap<String, String>> {
	Some(HashMap::from([(
		"network".to_string(),
		network.to_string(),
	)]))
}

/// Runs sweeps on a cron schedule
///
/// # Type Parameters
/// * `S` - Document store implementation
/// * `N` - Notification channel implementation
/// * `J` - Job scheduler implementation (must implement JobSchedulerTrait)
pub struct CleanupScheduler<S: ?Sized, N: ?Sized, J>
where
	J: JobSchedulerTrait,
{
	reconciler: Arc<Reconciler<S, N>>,
	pub scheduler: J,
	scheduled: Vec<Network>,
}

impl<S, N, J> CleanupScheduler<S, N, J>
where
	S: DocumentStore + ?Sized + 'static,
	N: Notifier + ?Sized + 'static,
	J: JobSchedulerTrait,
{
	/// Creates a scheduler without any job
	pub async fn new(reconciler: Arc<Reconciler<S, N>>) -> Result<Self, ReconcilerError> {
		let scheduler = J::new().await.map_err(|e| {
			ReconcilerError::scheduler_error("Failed to create job scheduler", Some(e), None)
		})?;
		Ok(Self {
			reconciler,
			scheduler,
			scheduled: Vec::new(),
		})
	}

	/// Adds the sweep job of a network
	///
	/// # Returns
	/// * `Result<bool, ReconcilerError>` - false if cleanup is disabled for the network
	pub async fn schedule(
		&mut self,
		network: Network,
		config: &CleanupConfig,
	) -> Result<bool, ReconcilerError> {
		if !config.enabled {
			tracing::info!(%network, "Cleanup disabled, not scheduling");
			return Ok(false);
		}

		let reconciler = self.reconciler.clone();
		let job = Job::new_async(config.cron_schedule.as_str(), move |_uuid, _l| {
			let reconciler = reconciler.clone();
			Box::pin(async move {
				match reconciler.cleanup(network).await {
					Ok(result) => tracing::info!(
						%network,
						start = result.start,
						stop = result.stop,
						failed = result.failed.len(),
						"Scheduled cleanup finished"
					),
					Err(e) => tracing::error!(%network, error = %e, "Scheduled cleanup failed"),
				}
			})
		})
		.map_err(|e| {
			ReconcilerError::scheduler_error(
				format!("Failed to create cleanup job: {}", e),
				Some(e.into()),
				network_metadata(network),
			)
		})?;

		self.scheduler.add(job).await.map_err(|e| {
			ReconcilerError::scheduler_error(e.to_string(), Some(e), network_metadata(network))
		})?;

		self.scheduled.push(network);
		tracing::info!(
			"Scheduled cleanup for network: {} with schedule: {}",
			network,
			config.cron_schedule
		);
		Ok(true)
	}

	/// Adds the sweep jobs of every configured network
	///
	/// # Returns
	/// * `Result<usize, ReconcilerError>` - Number of jobs added
	pub async fn schedule_all(&mut self, networks: &[NetworkConfig]) -> Result<usize, ReconcilerError> {
		let mut added = 0;
		for network in networks {
			if self.schedule(network.network, &network.cleanup).await? {
				added += 1;
			}
		}
		Ok(added)
	}

	/// Starts running the scheduled jobs
	pub async fn start(&self) -> Result<(), ReconcilerError> {
		self.scheduler.start().await.map_err(|e| {
			ReconcilerError::scheduler_error(e.to_string(), Some(e), None)
		})?;
		tracing::info!("Started cleanup scheduler for {} network(s)", self.scheduled.len());
		Ok(())
	}

	/// Stops the scheduler
	pub async fn stop(&mut self) -> Result<(), ReconcilerError> {
		self.scheduler.shutdown().await.map_err(|e| {
			ReconcilerError::scheduler_error(e.to_string(), Some(e), None)
		})?;
		tracing::info!("Stopped cleanup scheduler");
		Ok(())
	}

	/// Networks with a registered sweep job
	pub fn scheduled_networks(&self) -> &[Network] {
		&self.scheduled
	}
}
