//! JSONL request dispatch.
//!
//! Each connection carries a stream of request lines:
//!
//! ```json
//! {"command":["FT.DROPINDEX","idx"]}
//! ```
//!
//! and receives one response line per request, either
//!
//! ```json
//! {"kind":"reply","value":"OK"}
//! ```
//!
//! or
//!
//! ```json
//! {"kind":"error","message":"ERR Index with name 'idx' not found"}
//! ```
//!
//! Requests carry no identity. A connection runs as the `default` user
//! unless its first request is `{"command":["AUTH","<user>"]}`, and keeps
//! that user until it closes.
//!
//! Apart from `AUTH`, which binds the connection's user, every request goes
//! through the [`warden_gate::DispatchGate`].

mod errors;
mod handler;
mod request;
mod response;
mod session;

pub use self::errors::DispatchError;
pub use self::handler::DispatchConnectionHandler;
pub use self::request::CommandRequest;
pub use self::response::{DaemonMessage, ResponseWriter};

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
