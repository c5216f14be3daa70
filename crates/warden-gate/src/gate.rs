//! The request-time access decision.
//!
//! Every call walks the same stages:
//!
//! ```text
//! Received -> Normalized -> LookedUp -> PrivilegeChecked -> Forwarded
//!                  |            |              |
//!                  +------------+--------------+-> Rejected
//! ```
//!
//! Lookup runs first, then the privilege check, then the arity check. A
//! caller without the required tier is therefore rejected on privilege no
//! matter how many arguments it sends.

use std::sync::Arc;

use tracing::debug;

use crate::handler::{Invocation, Reply};
use crate::normalize::{NormalizedCommand, normalize};
use crate::principal::CallerPrincipal;
use crate::registry::{CommandRegistry, CommandSpec};
use crate::report::{DisclosurePolicy, ErrorReporter, ExternalError, Rejection, RejectionReason};
use crate::resolver::{PermissionSource, satisfies};

/// Tracing target for gate decisions.
pub(crate) const GATE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::gate");

/// Outcome of evaluating a call without running it.
#[derive(Debug)]
pub enum Decision<'r> {
    /// The call may run; holds the matched spec.
    Forward(&'r CommandSpec),
    /// The call is refused.
    Reject(Rejection),
}

/// Access gate sitting in front of every registered command.
///
/// The gate holds no mutable state. The registry is shared read-only and
/// the caller's permissions are fetched from the [`PermissionSource`] on
/// every call.
#[derive(Clone)]
pub struct DispatchGate {
    registry: Arc<CommandRegistry>,
    permissions: Arc<dyn PermissionSource>,
    reporter: ErrorReporter,
}

impl DispatchGate {
    /// Creates a gate over `registry` backed by `permissions`.
    pub fn new(
        registry: Arc<CommandRegistry>,
        permissions: Arc<dyn PermissionSource>,
        policy: DisclosurePolicy,
    ) -> Self {
        Self {
            registry,
            permissions,
            reporter: ErrorReporter::new(policy),
        }
    }

    /// Registry the gate consults.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Reporter used to word rejections.
    #[must_use]
    pub const fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// Current permissions of `user`, fetched from the permission source.
    #[must_use]
    pub fn resolve(&self, user: &str) -> CallerPrincipal {
        self.permissions.resolve(user)
    }

    /// Decides whether `caller` may run `command`.
    ///
    /// Pure with respect to its inputs: nothing is invoked or cached.
    #[must_use]
    pub fn evaluate(&self, caller: &CallerPrincipal, command: &NormalizedCommand) -> Decision<'_> {
        let Some(spec) = self.registry.lookup(&command.canonical) else {
            return Decision::Reject(rejection(
                RejectionReason::UnknownCommand,
                caller,
                command,
                None,
            ));
        };

        if !satisfies(caller, spec.tier()) {
            return Decision::Reject(rejection(
                RejectionReason::InsufficientPrivilege,
                caller,
                command,
                Some(spec),
            ));
        }

        if !spec.arity().accepts(command.arg_count()) {
            return Decision::Reject(rejection(
                RejectionReason::WrongArity,
                caller,
                command,
                Some(spec),
            ));
        }

        Decision::Forward(spec)
    }

    /// Runs one request for `user` through the gate.
    ///
    /// On success the handler's reply is returned unchanged. Every failure,
    /// whether a rejection or a handler error, becomes an [`ExternalError`].
    ///
    /// # Errors
    ///
    /// Returns the wire error for malformed requests, rejections, and
    /// handler failures.
    pub fn dispatch<S: AsRef<str>>(&self, user: &str, tokens: &[S]) -> Result<Reply, ExternalError> {
        let command = normalize(tokens).map_err(|error| {
            debug!(target: GATE_TARGET, user, %error, "malformed command");
            self.reporter.report_malformed(&error)
        })?;

        let caller = self.permissions.resolve(user);
        match self.evaluate(&caller, &command) {
            Decision::Forward(spec) => {
                debug!(
                    target: GATE_TARGET,
                    user,
                    command = spec.name(),
                    args = command.arg_count(),
                    "forwarding command"
                );
                let invocation = Invocation {
                    command: spec.name(),
                    args: &command.args,
                    caller: &caller,
                };
                spec.handler()
                    .call(&invocation)
                    .map_err(|error| ExternalError::new(error.message()))
            }
            Decision::Reject(rejection) => {
                debug!(
                    target: GATE_TARGET,
                    user,
                    command = %rejection.canonical,
                    reason = ?rejection.reason,
                    disclosed = ?self.reporter.disclosed_reason(&rejection),
                    "rejecting command"
                );
                Err(self.reporter.report(&rejection))
            }
        }
    }
}

impl std::fmt::Debug for DispatchGate {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DispatchGate")
            .field("commands", &self.registry.len())
            .field("reporter", &self.reporter)
            .finish_non_exhaustive()
    }
}

fn rejection(
    reason: RejectionReason,
    caller: &CallerPrincipal,
    command: &NormalizedCommand,
    spec: Option<&CommandSpec>,
) -> Rejection {
    Rejection {
        reason,
        command: command.original.clone(),
        canonical: command.canonical.clone(),
        args: command.args.clone(),
        user: caller.user().to_owned(),
        visibility: spec.map(CommandSpec::visibility),
    }
}
