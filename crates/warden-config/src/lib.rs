//! Shared configuration for the Warden command server.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then a
//! TOML file (`--config-path` or `WARDEN_CONFIG_PATH`), then `WARDEN_*`
//! environment variables, then command-line flags. The same [`Config`] type
//! is consumed by the daemon bootstrap and by integration tests.

mod defaults;
mod logging;
mod socket;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_TCP_PORT, default_disclosure_policy, default_log_filter,
    default_log_filter_string, default_log_format, default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};
pub use warden_gate::DisclosurePolicy;

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "WARDEN")]
pub struct Config {
    /// Endpoint the daemon listens on.
    #[serde(default = "default_socket_endpoint")]
    #[ortho_config(default = default_socket_endpoint())]
    pub daemon_socket: SocketEndpoint,
    /// `tracing` filter expression, for example `info,wardend::gate=debug`.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// How privilege failures on internal commands are worded.
    #[serde(default = "default_disclosure_policy")]
    #[ortho_config(default = default_disclosure_policy())]
    pub disclosure_policy: DisclosurePolicy,
    /// Acknowledge internal updates that fail to parse or apply instead of
    /// returning an error.
    #[serde(default)]
    #[ortho_config(default = false)]
    pub skip_corrupted_entries: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_socket: default_socket_endpoint(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            disclosure_policy: default_disclosure_policy(),
            skip_corrupted_entries: false,
        }
    }
}

impl Config {
    /// Endpoint the daemon listens on.
    #[must_use]
    pub fn daemon_socket(&self) -> &SocketEndpoint {
        &self.daemon_socket
    }

    /// Configured `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Configured log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Disclosure policy handed to the dispatch gate.
    #[must_use]
    pub fn disclosure_policy(&self) -> DisclosurePolicy {
        self.disclosure_policy
    }

    /// Whether corrupted internal updates are acknowledged and skipped.
    #[must_use]
    pub fn skip_corrupted_entries(&self) -> bool {
        self.skip_corrupted_entries
    }
}
