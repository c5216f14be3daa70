//! The Warden command server daemon.
//!
//! `wardend` accepts JSONL command requests over a Unix or TCP socket and
//! runs each one through a [`warden_gate::DispatchGate`]. The gate looks the
//! command up in an immutable registry, checks the caller's live
//! permissions in the [`AclStore`], validates the argument count and only
//! then invokes the handler.
//!
//! The daemon registers a small index catalog (`FT.CREATE`, `FT._LIST`,
//! `FT.DROPINDEX`, `FT.INFO`), `PING`, the administrative `ACL` command and
//! the internal-only `FT.INTERNAL_UPDATE`. Internal commands require the
//! `admin` capability, and under the default
//! [`DisclosurePolicy::Conceal`](warden_config::DisclosurePolicy::Conceal)
//! callers without it cannot tell them apart from unknown names.
//!
//! Start-up runs through [`bootstrap_with`]: configuration, telemetry,
//! socket preparation, then the command table. Lifecycle events go to a
//! [`HealthReporter`].

mod acl;
mod bootstrap;
mod commands;
mod dispatch;
mod health;
mod process;
mod telemetry;
mod transport;

pub use acl::{AclError, AclRule, AclStore, DEFAULT_CAPABILITIES, DEFAULT_USER, KNOWN_CATEGORIES};
pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, RunningDaemon, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use commands::{
    CatalogError, DEFAULT_ENCODING_VERSION, IndexCatalog, IndexEntry, InternalUpdateCounts,
    InternalUpdateStats, MetadataEntry, Services, VersionHeader, build_registry,
};
pub use dispatch::{
    CommandRequest, DaemonMessage, DispatchConnectionHandler, DispatchError, ResponseWriter,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run, run_daemon,
    run_daemon_with,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
