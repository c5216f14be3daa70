//! Background accept loop.

use std::io;
#[cfg(test)]
use std::net::SocketAddr;
use std::net::{TcpListener, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};
use warden_config::SocketEndpoint;

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

const IDLE_POLL: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

#[derive(Debug)]
enum Acceptor {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

impl Acceptor {
    fn set_nonblocking(&self) -> io::Result<()> {
        match self {
            Self::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            Self::Unix(listener) => listener.set_nonblocking(true),
        }
    }

    /// Accepts one pending client, or `None` when nobody is waiting.
    fn poll(&self) -> io::Result<Option<ConnectionStream>> {
        let accepted = match self {
            Self::Tcp(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Tcp(stream))
            }),
            #[cfg(unix)]
            Self::Unix(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Unix(stream))
            }),
        };
        match accepted {
            Ok(stream) => Ok(Some(stream)),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }
}

/// A bound, not yet serving, socket.
#[derive(Debug)]
pub(crate) struct SocketListener {
    endpoint: SocketEndpoint,
    acceptor: Acceptor,
}

impl SocketListener {
    /// Binds `endpoint`. A TCP port of zero picks a free port; see
    /// [`Self::endpoint`] for the one chosen.
    pub(crate) fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        match endpoint {
            SocketEndpoint::Tcp { host, port } => {
                let listener = bind_tcp(endpoint, host, *port)?;
                let port = listener.local_addr().map_or(*port, |addr| addr.port());
                Ok(Self {
                    endpoint: SocketEndpoint::tcp(host.clone(), port),
                    acceptor: Acceptor::Tcp(listener),
                })
            }
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => Ok(Self {
                endpoint: endpoint.clone(),
                acceptor: Acceptor::Unix(super::unix::bind(path)?),
            }),
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => Err(ListenerError::UnsupportedUnix {
                endpoint: endpoint.to_string(),
            }),
        }
    }

    /// Endpoint actually bound.
    pub(crate) fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Local TCP address, or `None` for Unix sockets.
    #[cfg(test)]
    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        match &self.acceptor {
            Acceptor::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            Acceptor::Unix(_) => None,
        }
    }

    /// Starts accepting on a background thread.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        if let Err(source) = self.acceptor.set_nonblocking() {
            self.release();
            return Err(ListenerError::Configure { source });
        }
        let stop = Arc::new(AtomicBool::new(false));
        let accepted = Arc::new(AtomicU64::new(0));
        let thread = {
            let stop = Arc::clone(&stop);
            let accepted = Arc::clone(&accepted);
            thread::spawn(move || self.accept_loop(&stop, &accepted, &handler))
        };
        Ok(ListenerHandle {
            stop,
            accepted,
            thread: Some(thread),
        })
    }

    fn accept_loop(
        self,
        stop: &AtomicBool,
        accepted: &AtomicU64,
        handler: &Arc<dyn ConnectionHandler>,
    ) {
        info!(target: LISTENER_TARGET, endpoint = %self.endpoint, "listening");
        let mut last_error = None::<io::ErrorKind>;
        while !stop.load(Ordering::SeqCst) {
            match self.acceptor.poll() {
                Ok(Some(stream)) => {
                    last_error = None;
                    accepted.fetch_add(1, Ordering::Relaxed);
                    debug!(target: LISTENER_TARGET, peer = %stream.peer(), "connection accepted");
                    let handler = Arc::clone(handler);
                    thread::spawn(move || handler.handle(stream));
                }
                Ok(None) => thread::sleep(IDLE_POLL),
                Err(error) => {
                    // Log each distinct failure once per streak.
                    if last_error != Some(error.kind()) {
                        warn!(target: LISTENER_TARGET, %error, "accept failed");
                    }
                    last_error = Some(error.kind());
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }
        info!(
            target: LISTENER_TARGET,
            endpoint = %self.endpoint,
            connections = accepted.load(Ordering::Relaxed),
            "listener stopped"
        );
        self.release();
    }

    fn release(self) {
        #[cfg(unix)]
        if let Some(path) = self.endpoint.unix_path() {
            drop(self.acceptor);
            super::unix::remove(path);
        }
    }
}

/// Controls a running listener.
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    stop: Arc<AtomicBool>,
    accepted: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks the accept loop to stop. Connections already accepted keep
    /// running until their clients disconnect.
    pub(crate) fn shutdown(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Connections accepted so far.
    pub(crate) fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Waits for the accept loop to exit.
    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        self.shutdown();
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| ListenerError::ThreadPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

fn bind_tcp(endpoint: &SocketEndpoint, host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            endpoint: endpoint.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| ListenerError::NoAddress {
            endpoint: endpoint.to_string(),
        })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::Bind {
        endpoint: endpoint.to_string(),
        source,
    })
}
