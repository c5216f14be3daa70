//! Daemon bootstrap orchestration.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;
use warden_config::{Config, SocketEndpoint, SocketPreparationError};
use warden_gate::{CommandRegistry, DispatchGate, RegistryError};

use crate::commands::{Services, build_registry};
use crate::dispatch::DispatchConnectionHandler;
use crate::health::HealthReporter;
use crate::process::{LaunchError, ShutdownSignal};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

/// Source of the daemon configuration.
pub trait ConfigLoader: Send + Sync {
    /// Loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when no configuration can be built.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that layers defaults, file, environment and CLI flags through
/// [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a configuration built elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The socket directory could not be prepared.
    #[error("failed to prepare daemon socket: {source}")]
    Socket {
        /// Underlying filesystem error.
        #[source]
        source: SocketPreparationError,
    },
    /// The command table could not be built.
    #[error("failed to build command registry: {source}")]
    Registry {
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },
}

/// A bootstrapped daemon, ready to listen.
pub struct Daemon {
    config: Config,
    services: Services,
    gate: DispatchGate,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Daemon {
    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared state behind the command handlers.
    #[must_use]
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Gate every request passes through.
    #[must_use]
    pub fn gate(&self) -> &DispatchGate {
        &self.gate
    }

    /// Telemetry handle, mainly for tests.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Binds the configured endpoint and starts accepting connections.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] if the endpoint cannot be bound.
    pub fn listen(&self) -> Result<RunningDaemon, ListenerError> {
        let listener = SocketListener::bind(self.config.daemon_socket())?;
        let endpoint = listener.endpoint().clone();
        let handler = Arc::new(DispatchConnectionHandler::new(self.gate.clone()));
        let handle = listener.start(handler)?;
        self.reporter.listener_ready(&endpoint);
        Ok(RunningDaemon {
            endpoint,
            handle,
            reporter: Arc::clone(&self.reporter),
        })
    }

    /// Serves requests until `shutdown` fires, then stops the listener.
    ///
    /// # Errors
    ///
    /// Returns a [`LaunchError`] if the listener fails or the shutdown wait
    /// cannot be set up.
    pub fn serve(&self, shutdown: &dyn ShutdownSignal) -> Result<(), LaunchError> {
        let running = self.listen()?;
        let waited = shutdown.wait();
        running.stop()?;
        waited?;
        Ok(())
    }
}

/// A daemon whose listener is accepting connections.
pub struct RunningDaemon {
    endpoint: SocketEndpoint,
    handle: ListenerHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl RunningDaemon {
    /// Endpoint actually bound, with the chosen port for TCP port zero.
    #[must_use]
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Stops accepting and waits for the accept loop to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanicked`] if the accept loop
    /// panicked.
    pub fn stop(self) -> Result<(), ListenerError> {
        let connections = self.handle.accepted();
        self.handle.join()?;
        self.reporter.listener_stopped(&self.endpoint, connections);
        Ok(())
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// Loads configuration, initialises telemetry, prepares the socket
/// directory and builds the permission store, index catalog and command
/// table. Each failure is reported to `reporter` before it is returned.
///
/// # Errors
///
/// Returns the [`BootstrapError`] of the first stage that failed.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();
    match prepare(loader) {
        Ok(Prepared {
            config,
            services,
            registry,
            telemetry,
        }) => {
            reporter.bootstrap_succeeded(&config, registry.len());
            let gate = DispatchGate::new(
                Arc::new(registry),
                services.acl.clone(),
                config.disclosure_policy(),
            );
            Ok(Daemon {
                config,
                services,
                gate,
                telemetry,
                reporter,
            })
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

struct Prepared {
    config: Config,
    services: Services,
    registry: CommandRegistry,
    telemetry: TelemetryHandle,
}

fn prepare(loader: &dyn ConfigLoader) -> Result<Prepared, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    config
        .daemon_socket()
        .prepare_filesystem()
        .map_err(|source| BootstrapError::Socket { source })?;
    let services = Services::new(config.skip_corrupted_entries());
    let registry =
        build_registry(&services).map_err(|source| BootstrapError::Registry { source })?;
    Ok(Prepared {
        config,
        services,
        registry,
        telemetry,
    })
}
