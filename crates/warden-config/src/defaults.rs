#[cfg(unix)]
use camino::Utf8PathBuf;
#[cfg(unix)]
use std::env;

#[cfg(unix)]
use dirs::runtime_dir;
#[cfg(unix)]
use libc::geteuid;

use warden_gate::DisclosurePolicy;

use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// TCP port used when Unix domain sockets are unavailable.
pub const DEFAULT_TCP_PORT: u16 = 6390;

/// Log filter applied when none is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Returns the default log filter expression.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned copy of the default log filter for serde and derive defaults.
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Returns the default log output format.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Returns the disclosure policy applied to rejected internal commands.
///
/// Concealment is the default so an unprivileged caller cannot tell an
/// internal command apart from an unregistered one.
pub fn default_disclosure_policy() -> DisclosurePolicy {
    DisclosurePolicy::Conceal
}

/// Computes the default socket endpoint for the daemon.
pub fn default_socket_endpoint() -> SocketEndpoint {
    default_socket_endpoint_inner()
}

#[cfg(unix)]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    let (mut base, per_user) = match runtime_dir().and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok())
    {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("warden");
    if per_user {
        // SAFETY: `geteuid` has no preconditions and cannot fail.
        let uid = unsafe { geteuid() };
        base.push(format!("uid-{uid}"));
    }

    SocketEndpoint::unix(base.join("wardend.sock"))
}

#[cfg(unix)]
fn fallback_base_directory() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(not(unix))]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
}
