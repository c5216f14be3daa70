//! Unix socket binding with stale socket recovery.

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener, UnixStream};

use camino::Utf8Path;
use tracing::{info, warn};

use super::{LISTENER_TARGET, ListenerError};

/// Binds `path`, first removing a socket file left by a dead process.
///
/// A path that still accepts connections belongs to a live server and is
/// left alone.
pub(super) fn bind(path: &Utf8Path) -> Result<UnixListener, ListenerError> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if !metadata.file_type().is_socket() => {
            return Err(ListenerError::NotASocket {
                path: path.to_string(),
            });
        }
        Ok(_) => reclaim_stale(path)?,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ListenerError::Inspect {
                path: path.to_string(),
                source,
            });
        }
    }

    UnixListener::bind(path).map_err(|source| ListenerError::Bind {
        endpoint: format!("unix://{path}"),
        source,
    })
}

fn reclaim_stale(path: &Utf8Path) -> Result<(), ListenerError> {
    match UnixStream::connect(path) {
        Ok(_live) => Err(ListenerError::SocketInUse {
            path: path.to_string(),
        }),
        Err(error)
            if matches!(
                error.kind(),
                io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
            ) =>
        {
            fs::remove_file(path).map_err(|source| ListenerError::RemoveStale {
                path: path.to_string(),
                source,
            })?;
            info!(target: LISTENER_TARGET, path = %path, "removed stale unix socket");
            Ok(())
        }
        Err(source) => Err(ListenerError::Inspect {
            path: path.to_string(),
            source,
        }),
    }
}

/// Deletes the socket file on shutdown.
pub(super) fn remove(path: &Utf8Path) {
    if let Err(error) = fs::remove_file(path)
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: LISTENER_TARGET,
            path = %path,
            %error,
            "failed to remove unix socket"
        );
    }
}
