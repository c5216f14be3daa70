//! Command access gate for the Warden command server.
//!
//! Every client command passes through a [`DispatchGate`] before its handler
//! runs. The gate case-folds the command name, looks it up in an immutable
//! [`CommandRegistry`], asks a [`PermissionSource`] for the caller's current
//! capabilities, and checks the argument count. Calls that fail any check
//! are turned into wire errors by an [`ErrorReporter`] under a single
//! [`DisclosurePolicy`].
//!
//! Internal-only commands always require [`PrivilegeTier::Admin`]. With
//! [`DisclosurePolicy::Conceal`], an unprivileged caller cannot tell such a
//! command from one that does not exist.
//!
//! Permissions are resolved afresh on every call, so revoking a grant takes
//! effect on the caller's very next request.

mod gate;
mod handler;
mod normalize;
mod principal;
mod registry;
mod report;
mod resolver;

pub use gate::{Decision, DispatchGate};
pub use handler::{CommandHandler, HandlerError, HandlerResult, Invocation, Reply};
pub use normalize::{NormalizeError, NormalizedCommand, normalize};
pub use principal::{ADMIN_CAPABILITY, CallerPrincipal, normalise_capability};
pub use registry::{
    Arity, CommandRegistry, CommandSpec, RegistryBuilder, RegistryError, Visibility,
};
pub use report::{DisclosurePolicy, ErrorReporter, ExternalError, Rejection, RejectionReason};
pub use resolver::{PermissionSource, PrivilegeTier, satisfies};
