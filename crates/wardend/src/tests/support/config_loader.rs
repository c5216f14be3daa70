//! Configuration loaders for the success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;
use warden_config::{Config, DisclosurePolicy, LogFormat, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader producing a daemon configuration suited to tests.
///
/// TCP loaders bind an ephemeral loopback port; Unix loaders place the
/// socket inside a private temporary directory.
pub struct TestConfigLoader {
    endpoint: SocketEndpoint,
    disclosure_policy: DisclosurePolicy,
    skip_corrupted_entries: bool,
    _socket_dir: Option<TempDir>,
}

impl TestConfigLoader {
    /// Loopback TCP on port zero.
    #[must_use]
    pub fn tcp() -> Self {
        Self {
            endpoint: SocketEndpoint::tcp("127.0.0.1", 0),
            disclosure_policy: DisclosurePolicy::Conceal,
            skip_corrupted_entries: false,
            _socket_dir: None,
        }
    }

    /// Unix socket under a fresh temporary directory.
    #[must_use]
    pub fn unix() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory for socket");
        let path = dir
            .path()
            .join("run")
            .join("wardend.sock")
            .to_str()
            .expect("temporary socket path was not valid UTF-8")
            .to_owned();
        Self {
            endpoint: SocketEndpoint::unix(path),
            disclosure_policy: DisclosurePolicy::Conceal,
            skip_corrupted_entries: false,
            _socket_dir: Some(dir),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: DisclosurePolicy) -> Self {
        self.disclosure_policy = policy;
        self
    }

    #[must_use]
    pub fn skipping_corrupted_entries(mut self) -> Self {
        self.skip_corrupted_entries = true;
        self
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            daemon_socket: self.endpoint.clone(),
            log_filter: "warn".to_owned(),
            log_format: LogFormat::Compact,
            disclosure_policy: self.disclosure_policy,
            skip_corrupted_entries: self.skip_corrupted_entries,
        })
    }
}

/// Loader that fails by passing an unparseable socket flag.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("wardend"),
            OsString::from("--daemon-socket"),
            OsString::from("invalid://socket"),
        ];
        Config::load_from_iter(args)
    }
}
