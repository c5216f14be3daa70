//! Errors raised while binding or running the listener.

use std::io;

use thiserror::Error;

/// Failures surfaced by the socket listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Host name resolution failed.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        /// Endpoint being bound.
        endpoint: String,
        /// Underlying resolver error.
        #[source]
        source: io::Error,
    },
    /// Resolution returned no addresses.
    #[error("no addresses resolved for {endpoint}")]
    NoAddress {
        /// Endpoint being bound.
        endpoint: String,
    },
    /// Binding the socket failed.
    #[error("failed to bind {endpoint}: {source}")]
    Bind {
        /// Endpoint being bound.
        endpoint: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// Switching the listener to non-blocking mode failed.
    #[error("failed to configure listener: {source}")]
    Configure {
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// Unix sockets are not available on this platform.
    #[cfg(not(unix))]
    #[error("unix sockets are unsupported for endpoint {endpoint}")]
    UnsupportedUnix {
        /// Requested endpoint.
        endpoint: String,
    },
    /// Another process is serving the socket path.
    #[cfg(unix)]
    #[error("unix socket {path} is already in use")]
    SocketInUse {
        /// Socket path.
        path: String,
    },
    /// The socket path exists but is something else.
    #[cfg(unix)]
    #[error("{path} exists and is not a socket")]
    NotASocket {
        /// Offending path.
        path: String,
    },
    /// Inspecting or probing an existing socket failed.
    #[cfg(unix)]
    #[error("failed to inspect existing socket {path}: {source}")]
    Inspect {
        /// Socket path.
        path: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Removing a stale socket failed.
    #[cfg(unix)]
    #[error("failed to remove stale socket {path}: {source}")]
    RemoveStale {
        /// Socket path.
        path: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The accept thread panicked.
    #[error("listener thread panicked")]
    ThreadPanicked,
}
