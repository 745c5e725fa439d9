//! Reconciler configuration loading and validation.
//!
//! The configuration is a single JSON document listing the networks to
//! reconcile, where each network's store lives, the sweep schedule and the
//! notification channel.

use serde::{Deserialize, Serialize};
use std::{
	collections::{HashMap, HashSet},
	path::{Path, PathBuf},
};
use thiserror::Error;

use crate::{models::Network, utils::logging::error::ErrorContext};

/// Default width of the sweep window, in heights
pub const DEFAULT_CLEANUP_WINDOW: u64 = 10_000;

/// Default cron schedule of the sweep (every ten minutes)
pub const DEFAULT_CLEANUP_SCHEDULE: &str = "0 */10 * * * *";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The configuration file could not be read
	#[error("File error: {0}")]
	FileError(Box<ErrorContext>),

	/// The configuration file is not valid JSON for the schema
	#[error("Parse error: {0}")]
	ParseError(Box<ErrorContext>),

	/// The configuration is well formed but inconsistent
	#[error("Validation error: {0}")]
	ValidationError(Box<ErrorContext>),
}

impl ConfigError {
	pub fn file_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::FileError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}

	pub fn parse_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ParseError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}

	pub fn validation_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ValidationError(Box::new(ErrorContext::new_with_log(
			msg, source, metadata,
		)))
	}
}

/// Sweep settings for a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupConfig {
	#[serde(default = "default_true")]
	pub enabled: bool,
	#[serde(default = "default_cron_schedule")]
	pub cron_schedule: String,
	/// Number of heights below the frontier covered by one sweep
	#[serde(default = "default_window")]
	pub window: u64,
}

impl Default for CleanupConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			cron_schedule: default_cron_schedule(),
			window: DEFAULT_CLEANUP_WINDOW,
		}
	}
}

fn default_true() -> bool {
	true
}

fn default_cron_schedule() -> String {
	DEFAULT_CLEANUP_SCHEDULE.to_string()
}

fn default_window() -> u64 {
	DEFAULT_CLEANUP_WINDOW
}

/// Store location and sweep settings of one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
	pub network: Network,
	pub storage_path: PathBuf,
	#[serde(default)]
	pub cleanup: CleanupConfig,
}

/// Notification channel settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
	/// Webhook receiving `{"text": message}`; notifications are only logged when unset
	#[serde(default)]
	pub webhook_url: Option<String>,
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
}

impl Default for NotificationConfig {
	fn default() -> Self {
		Self {
			webhook_url: None,
			max_retries: default_max_retries(),
		}
	}
}

fn default_max_retries() -> u32 {
	3
}

/// Top-level reconciler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcilerConfig {
	pub networks: Vec<NetworkConfig>,
	#[serde(default)]
	pub notification: NotificationConfig,
}

impl ReconcilerConfig {
	/// Loads and validates a configuration file
	pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		let metadata = Some(HashMap::from([(
			"path".to_string(),
			path.display().to_string(),
		)]));

		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::file_error(
				"Failed to read configuration file",
				Some(e.into()),
				metadata.clone(),
			)
		})?;

		let config: ReconcilerConfig = serde_json::from_str(&content).map_err(|e| {
			ConfigError::parse_error("Failed to parse configuration file", Some(e.into()), metadata)
		})?;

		config.validate()?;
		Ok(config)
	}

	/// Checks the configuration for inconsistencies
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.networks.is_empty() {
			return Err(ConfigError::validation_error(
				"At least one network must be configured",
				None,
				None,
			));
		}

		let mut seen = HashSet::new();
		for network in &self.networks {
			let metadata = Some(HashMap::from([(
				"network".to_string(),
				network.network.to_string(),
			)]));

			if !seen.insert(network.network) {
				return Err(ConfigError::validation_error(
					"Network is configured more than once",
					None,
					metadata,
				));
			}

			if network.cleanup.window == 0 {
				return Err(ConfigError::validation_error(
					"Cleanup window must be greater than zero",
					None,
					metadata,
				));
			}

			let fields = network.cleanup.cron_schedule.split_whitespace().count();
			if network.cleanup.enabled && !(6..=7).contains(&fields) {
				return Err(ConfigError::validation_error(
					format!(
						"Invalid cron schedule '{}': expected 6 or 7 fields",
						network.cleanup.cron_schedule
					),
					None,
					metadata,
				));
			}
		}

		if let Some(url) = &self.notification.webhook_url {
			reqwest::Url::parse(url).map_err(|e| {
				ConfigError::validation_error(
					format!("Invalid webhook url '{}'", url),
					Some(e.into()),
					None,
				)
			})?;
		}

		Ok(())
	}

	/// Returns the configuration of a network, if present
	pub fn network(&self, network: Network) -> Option<&NetworkConfig> {
		self.networks.iter().find(|n| n.network == network)
	}
}
