//! Logging setup.
//!
//! Log level comes from `RUST_LOG` (full filter syntax) or `LOG_LEVEL` (a bare
//! level), defaulting to `info`. `LOG_FORMAT=json` switches to structured JSON
//! output, anything else uses the human-readable formatter.

pub mod error;

use tracing_subscriber::{fmt, EnvFilter};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
	Plain,
	Json,
}

impl LogFormat {
	fn from_env_value(value: Option<&str>) -> Self {
		match value.map(|v| v.trim().to_ascii_lowercase()) {
			Some(v) if v == "json" => LogFormat::Json,
			_ => LogFormat::Plain,
		}
	}
}

fn build_filter(rust_log: Option<String>, log_level: Option<String>) -> EnvFilter {
	rust_log
		.and_then(|directives| EnvFilter::try_new(directives).ok())
		.or_else(|| log_level.and_then(|level| EnvFilter::try_new(level).ok()))
		.unwrap_or_else(|| EnvFilter::new("info"))
}

/// Installs the global tracing subscriber
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error + Send + Sync>>` - Error if a global
///   subscriber was already installed
pub fn setup_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let filter = build_filter(
		std::env::var("RUST_LOG").ok(),
		std::env::var("LOG_LEVEL").ok(),
	);
	let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());

	let result = match format {
		LogFormat::Json => fmt()
			.json()
			.with_env_filter(filter)
			.with_target(true)
			.try_init(),
		LogFormat::Plain => fmt().with_env_filter(filter).with_target(false).try_init(),
	};
	result.map_err(Into::into)
}
