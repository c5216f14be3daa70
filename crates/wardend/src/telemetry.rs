//! Global `tracing` subscriber setup.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

use warden_config::{Config, LogFormat};

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Proof that telemetry is configured for this process.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors raised while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The log filter expression did not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Rejected expression.
        filter: String,
        /// Parser message.
        message: String,
    },
    /// Another subscriber was installed outside this module.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Installs the global subscriber on first use.
///
/// Later calls return a handle without touching global state, so the
/// first configuration wins for the life of the process.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a foreign
/// subscriber is already installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            let subscriber = build_subscriber(config.log_filter(), config.log_format())?;
            tracing::subscriber::set_global_default(subscriber)?;
            Ok::<_, TelemetryError>(())
        })
        .map(|_| TelemetryHandle)
}

fn build_subscriber(
    filter: &str,
    format: LogFormat,
) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryError> {
    let env_filter = EnvFilter::try_new(filter).map_err(|error| TelemetryError::Filter {
        filter: filter.to_owned(),
        message: error.to_string(),
    })?;
    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    Ok(match format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    })
}
