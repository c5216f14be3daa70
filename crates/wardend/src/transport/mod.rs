//! Socket transport for the daemon.
//!
//! A [`SocketListener`] binds the configured endpoint and hands every
//! accepted stream to a [`ConnectionHandler`] on its own thread. The
//! transport knows nothing about the request protocol.

mod errors;
mod listener;
mod stream;
#[cfg(test)]
mod test_utils;
#[cfg(unix)]
mod unix;

pub use self::errors::ListenerError;
pub(crate) use self::listener::{ListenerHandle, SocketListener};
pub(crate) use self::stream::{ConnectionHandler, ConnectionStream};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
