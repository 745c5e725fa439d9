//! Indexer reconciler command line.
//!
//! Loads the configuration, opens one file store per network and either runs
//! the scheduled sweeps or executes a single operation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tokio_cron_scheduler::JobScheduler;

use indexer_reconciler::{
	models::{ContentKind, Network, ReconcilerConfig},
	services::{
		notification::{notifier_from_config, Notifier},
		reconciler::{diagnose_height, CleanupScheduler, NetworkStores, Reconciler},
		store::{heights_with_logged_content, FileDocumentStore},
	},
	utils::{logging::setup_logging, metrics::gather_metrics},
};

type FileReconciler = Reconciler<FileDocumentStore, dyn Notifier>;

#[derive(Debug, Parser)]
#[command(name = "indexer-reconciler", version, about)]
struct Cli {
	/// Path to the configuration file
	#[arg(
		long,
		env = "RECONCILER_CONFIG",
		default_value = "config/reconciler.json"
	)]
	config: PathBuf,

	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Run the scheduled sweeps until interrupted
	Run,
	/// Check a single height and queue it for repair if it fails
	Check {
		#[arg(long)]
		network: Network,
		#[arg(long)]
		height: u64,
	},
	/// Sweep the window below the processing frontier once
	Cleanup {
		/// Network to sweep; every configured network when omitted
		#[arg(long)]
		network: Option<Network>,
	},
	/// List block log heights recording a content kind
	Inspect {
		#[arg(long)]
		network: Network,
		#[arg(long)]
		kind: ContentKind,
		#[arg(long, default_value_t = 0)]
		skip: usize,
		#[arg(long, default_value_t = 100)]
		limit: usize,
	},
	/// Show expected, linked and present records of every dataset at a height
	Diagnose {
		#[arg(long)]
		network: Network,
		#[arg(long)]
		height: u64,
	},
}

fn build_reconciler(config: &ReconcilerConfig) -> Result<FileReconciler> {
	let stores = config
		.networks
		.iter()
		.fold(NetworkStores::new(), |stores, network| {
			stores.with_store_and_window(
				network.network,
				Arc::new(FileDocumentStore::new(network.storage_path.clone())),
				network.cleanup.window,
			)
		});
	let notifier =
		notifier_from_config(&config.notification).context("Failed to set up notifications")?;
	Ok(Reconciler::new(stores, notifier))
}

fn store_for(config: &ReconcilerConfig, network: Network) -> Result<FileDocumentStore> {
	let network_config = config
		.network(network)
		.with_context(|| format!("Network {} is not configured", network))?;
	Ok(FileDocumentStore::new(network_config.storage_path.clone()))
}

async fn run_scheduler(config: &ReconcilerConfig, reconciler: FileReconciler) -> Result<()> {
	let mut scheduler: CleanupScheduler<_, _, JobScheduler> =
		CleanupScheduler::new(Arc::new(reconciler)).await?;
	let scheduled = scheduler.schedule_all(&config.networks).await?;
	if scheduled == 0 {
		tracing::warn!("No network has cleanup enabled, nothing to run");
		return Ok(());
	}

	scheduler.start().await?;
	tokio::signal::ctrl_c()
		.await
		.context("Failed to listen for shutdown signal")?;
	tracing::info!("Shutdown signal received");
	scheduler.stop().await?;
	Ok(())
}

fn log_metrics() {
	match gather_metrics() {
		Ok(metrics) => tracing::debug!("{}", String::from_utf8_lossy(&metrics)),
		Err(e) => tracing::warn!(error = %e, "Failed to gather metrics"),
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	setup_logging().map_err(|e| anyhow::anyhow!("Failed to set up logging: {}", e))?;

	let config = ReconcilerConfig::load_from_path(&cli.config)
		.await
		.with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
	let reconciler = build_reconciler(&config)?;

	match cli.command {
		Command::Run => run_scheduler(&config, reconciler).await?,
		Command::Check { network, height } => {
			let result = reconciler.lookup_block(network, height).await?;
			let reasons: Vec<String> = result.reasons.iter().map(ToString::to_string).collect();
			println!(
				"{} height {}: {} {:?}{}",
				network,
				result.height,
				if result.ok { "ok" } else { "FAILED" },
				reasons,
				if result.newly_queued {
					" (queued for repair)"
				} else {
					""
				}
			);
		}
		Command::Cleanup { network } => {
			let networks = match network {
				Some(network) => vec![network],
				None => reconciler.networks(),
			};
			for network in networks {
				let result = reconciler.cleanup(network).await?;
				println!(
					"{} {}-{}: coarse {}, scanned {}, failed {:?}, newly queued {}",
					network,
					result.start,
					result.stop,
					if result.coarse_ok { "ok" } else { "failed" },
					result.scanned,
					result.failed,
					result.enqueued
				);
			}
		}
		Command::Inspect {
			network,
			kind,
			skip,
			limit,
		} => {
			let store = store_for(&config, network)?;
			let heights = heights_with_logged_content(&store, kind, skip, limit).await?;
			for height in heights {
				println!("{}", height);
			}
		}
		Command::Diagnose { network, height } => {
			let store = store_for(&config, network)?;
			for diagnosis in diagnose_height(&store, height).await? {
				println!(
					"{}: expected {}, linked {}, present {}{}",
					diagnosis.dataset,
					diagnosis.expected.len(),
					diagnosis.linked.len(),
					diagnosis.present,
					if diagnosis.is_consistent() {
						""
					} else {
						" (inconsistent)"
					}
				);
				for id in diagnosis.unlinked() {
					println!("  not linked: {}", id);
				}
				for id in diagnosis.unexpected() {
					println!("  not logged: {}", id);
				}
			}
		}
	}

	log_metrics();
	Ok(())
}
