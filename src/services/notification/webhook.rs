//! Webhook notifier.
//!
//! Posts `{"text": <message>}` to a configured URL. Transient failures are
//! retried with exponential backoff by the client middleware.

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde_json::json;
use std::collections::HashMap;

use crate::services::notification::{error::NotificationError, Notifier};

/// Notifier delivering messages to an HTTP webhook
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
	url: reqwest::Url,
	client: ClientWithMiddleware,
}

impl WebhookNotifier {
	/// Creates a webhook notifier
	///
	/// # Arguments
	/// * `url` - Endpoint receiving the POST requests
	/// * `max_retries` - Retries attempted for transient failures
	///
	/// # Returns
	/// * `Result<Self, NotificationError>` - Notifier or a config error for an invalid URL
	pub fn new(url: &str, max_retries: u32) -> Result<Self, NotificationError> {
		let url = reqwest::Url::parse(url).map_err(|e| {
			NotificationError::config_error(
				"Invalid webhook URL",
				Some(e.into()),
				Some(HashMap::from([("url".to_string(), url.to_string())])),
			)
		})?;

		let client = ClientBuilder::new(reqwest::Client::new())
			.with(RetryTransientMiddleware::new_with_policy(
				ExponentialBackoff::builder().build_with_max_retries(max_retries),
			))
			.build();

		Ok(Self { url, client })
	}

	pub fn url(&self) -> &reqwest::Url {
		&self.url
	}

	fn metadata(&self) -> Option<HashMap<String, String>> {
		Some(HashMap::from([("url".to_string(), self.url.to_string())]))
	}
}

#[async_trait]
impl Notifier for WebhookNotifier {
	async fn notify(&self, message: &str) -> Result<(), NotificationError> {
		let response = self
			.client
			.post(self.url.clone())
			.json(&json!({ "text": message }))
			.send()
			.await
			.map_err(|e| {
				NotificationError::request_error(
					"Failed to send webhook request",
					Some(e.into()),
					self.metadata(),
				)
			})?;

		response.error_for_status().map_err(|e| {
			let mut metadata = self.metadata().unwrap_or_default();
			if let Some(status) = e.status() {
				metadata.insert("status".to_string(), status.as_u16().to_string());
			}
			NotificationError::request_error(
				"Webhook returned an error status",
				Some(e.into()),
				Some(metadata),
			)
		})?;

		tracing::debug!(url = %self.url, "Notification delivered");
		Ok(())
	}
}
