use std::fmt;
use std::fs::DirBuilder;
use std::io;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Address the daemon listens on.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum SocketEndpoint {
    /// Unix domain socket at the given path.
    Unix { path: Utf8PathBuf },
    /// TCP socket bound to `host:port`.
    Tcp { host: String, port: u16 },
}

impl SocketEndpoint {
    /// Builds a Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a TCP socket endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Socket path for Unix endpoints; `None` for TCP.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_path()),
            Self::Tcp { .. } => None,
        }
    }

    /// Creates the parent directory of a Unix socket with owner-only access.
    ///
    /// TCP endpoints need no filesystem preparation and always succeed.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(path) = self.unix_path() else {
            return Ok(());
        };
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .ok_or_else(|| SocketPreparationError::MissingParent {
                path: path.to_path_buf(),
            })?;

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        match builder.create(parent.as_std_path()) {
            Err(source) if source.kind() != io::ErrorKind::AlreadyExists => {
                Err(SocketPreparationError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "unix://{path}"),
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        match url.scheme() {
            "unix" => match url.path() {
                "" => Err(SocketParseError::MissingUnixPath(input.to_owned())),
                path => Ok(Self::unix(path)),
            },
            "tcp" => {
                let host = url
                    .host_str()
                    .ok_or_else(|| SocketParseError::MissingHost(input.to_owned()))?;
                let port = url
                    .port()
                    .ok_or_else(|| SocketParseError::MissingPort(input.to_owned()))?;
                Ok(Self::tcp(host, port))
            }
            other => Err(SocketParseError::UnsupportedScheme(other.to_owned())),
        }
    }
}

/// Errors raised while parsing a [`SocketEndpoint`] from a URL.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// Only `unix://` and `tcp://` are understood.
    #[error("unsupported socket scheme '{0}'")]
    UnsupportedScheme(String),
    /// A `tcp://` URL had no host.
    #[error("missing TCP host in '{0}'")]
    MissingHost(String),
    /// A `tcp://` URL had no port.
    #[error("missing TCP port in '{0}'")]
    MissingPort(String),
    /// A `unix://` URL had no path.
    #[error("missing Unix socket path in '{0}'")]
    MissingUnixPath(String),
    /// The text was not a URL at all.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors raised while creating the socket's parent directory.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// The socket path has no parent component.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent { path: Utf8PathBuf },
    /// Creating the directory failed.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}
