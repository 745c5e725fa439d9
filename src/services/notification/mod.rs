//! Notification channel used to announce repairs.
//!
//! - `Notifier`: interface accepting one formatted message
//! - `LogNotifier`: writes messages to the log
//! - `WebhookNotifier`: posts messages to an HTTP webhook

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::NotificationConfig;

mod error;
mod webhook;

pub use error::NotificationError;
pub use webhook::WebhookNotifier;

/// Interface for notification channels
///
/// Delivery is fire-and-forget from the reconciler's point of view: errors are
/// reported so callers can log them, never retried by the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
	async fn notify(&self, message: &str) -> Result<(), NotificationError>;
}

/// Notifier that only logs the message
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
	async fn notify(&self, message: &str) -> Result<(), NotificationError> {
		tracing::info!(target: "notification", "{}", message);
		Ok(())
	}
}

/// Builds the notifier described by the configuration
///
/// Falls back to [`LogNotifier`] when no webhook is configured.
pub fn notifier_from_config(
	config: &NotificationConfig,
) -> Result<Arc<dyn Notifier>, NotificationError> {
	let notifier: Arc<dyn Notifier> = match &config.webhook_url {
		Some(url) => Arc::new(WebhookNotifier::new(url, config.max_retries)?),
		None => Arc::new(LogNotifier),
	};
	Ok(notifier)
}
