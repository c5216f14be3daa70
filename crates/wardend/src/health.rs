//! Lifecycle events for operators.

use std::sync::Arc;

use tracing::{error, info};
use warden_config::{Config, SocketEndpoint};

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer for daemon lifecycle events.
pub trait HealthReporter: Send + Sync {
    /// Configuration loading is about to begin.
    fn bootstrap_starting(&self);

    /// Bootstrap finished and the command table is built.
    fn bootstrap_succeeded(&self, config: &Config, commands: usize);

    /// Bootstrap stopped at `error`.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// The listener is accepting connections on `endpoint`.
    fn listener_ready(&self, endpoint: &SocketEndpoint);

    /// The listener stopped after accepting `connections` clients.
    fn listener_stopped(&self, endpoint: &SocketEndpoint, connections: u64);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config, commands: usize) {
        (**self).bootstrap_succeeded(config, commands);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listener_ready(&self, endpoint: &SocketEndpoint) {
        (**self).listener_ready(endpoint);
    }

    fn listener_stopped(&self, endpoint: &SocketEndpoint, connections: u64) {
        (**self).listener_stopped(endpoint, connections);
    }
}

/// Reporter that emits each event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        info!(target: HEALTH_TARGET, event = "bootstrap_starting", "starting daemon bootstrap");
    }

    fn bootstrap_succeeded(&self, config: &Config, commands: usize) {
        info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            socket = %config.daemon_socket(),
            log_filter = config.log_filter(),
            disclosure_policy = %config.disclosure_policy(),
            skip_corrupted_entries = config.skip_corrupted_entries(),
            commands,
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            %error,
            "daemon bootstrap failed"
        );
    }

    fn listener_ready(&self, endpoint: &SocketEndpoint) {
        info!(
            target: HEALTH_TARGET,
            event = "listener_ready",
            %endpoint,
            "accepting connections"
        );
    }

    fn listener_stopped(&self, endpoint: &SocketEndpoint, connections: u64) {
        info!(
            target: HEALTH_TARGET,
            event = "listener_stopped",
            %endpoint,
            connections,
            "listener stopped"
        );
    }
}
