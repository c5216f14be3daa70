//! Production wiring of bootstrap, listener and shutdown.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{info, warn};

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runs the daemon and maps the outcome to a process exit code.
///
/// Launch failures are written to `stderr`, since telemetry may not be
/// installed when they happen.
pub fn run<E: Write>(stderr: &mut E) -> ExitCode {
    exit_code(run_daemon(), stderr)
}

pub(crate) fn exit_code<E: Write>(outcome: Result<(), LaunchError>, stderr: &mut E) -> ExitCode {
    let Err(error) = outcome else {
        return ExitCode::SUCCESS;
    };
    if let Err(write_error) = writeln!(stderr, "wardend: {error}") {
        warn!(target: PROCESS_TARGET, %error, %write_error, "failed to report launch error");
    }
    ExitCode::FAILURE
}

/// Runs the daemon in the foreground until a termination signal arrives.
///
/// # Errors
///
/// Returns a [`LaunchError`] if bootstrap, the listener or signal handling
/// fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        &SystemShutdownSignal,
    )
}

/// Runs the daemon with injected collaborators.
///
/// # Errors
///
/// Returns a [`LaunchError`] if bootstrap, the listener or `shutdown`
/// fails.
pub fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let daemon = bootstrap_with(loader, reporter)?;
    daemon.serve(shutdown)?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
