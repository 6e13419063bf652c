//! Logging setup for the `leadscope` binary.

use crate::config::LoggingConfig;
use crate::error::ClientError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Output goes to
/// stderr so it never interleaves with command output on stdout.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ClientError> {
    let env_filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    result.map_err(|e| ClientError::Telemetry(format!("Failed to init subscriber: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, ClientError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| ClientError::Telemetry(format!("Invalid log filter: {}", e))),
    }
}
