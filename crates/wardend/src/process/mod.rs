//! Process lifecycle: signal handling and the production entry point.

mod errors;
mod launch;
mod shutdown;

pub use self::errors::LaunchError;
pub use self::launch::{run, run_daemon, run_daemon_with};
pub use self::shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

#[cfg(test)]
pub(crate) use self::launch::exit_code;
#[cfg(test)]
pub(crate) use self::shutdown::MockShutdownSignal;

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
