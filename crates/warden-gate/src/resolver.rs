//! Privilege tiers and the check deciding whether a caller meets one.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::principal::{ADMIN_CAPABILITY, CallerPrincipal};

/// Privilege a caller must hold to run a command.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PrivilegeTier {
    /// Any enabled user may run the command.
    Normal,
    /// Only users explicitly granted the `admin` capability.
    Admin,
}

/// Read-only view of the live permission store.
///
/// Implementations must reflect grants and revocations made before the call
/// returns; the gate resolves a fresh principal for every request.
#[cfg_attr(test, mockall::automock)]
pub trait PermissionSource: Send + Sync {
    /// Returns the current permissions of `user`.
    ///
    /// Unknown users resolve to [`CallerPrincipal::anonymous`].
    fn resolve(&self, user: &str) -> CallerPrincipal;
}

/// Decides whether `caller` meets `required`.
///
/// The result depends only on the two arguments. Disabled principals satisfy
/// nothing; `Admin` additionally needs the `admin` capability held explicitly.
#[must_use]
pub fn satisfies(caller: &CallerPrincipal, required: PrivilegeTier) -> bool {
    if !caller.is_enabled() {
        return false;
    }
    match required {
        PrivilegeTier::Normal => true,
        PrivilegeTier::Admin => caller.has_capability(ADMIN_CAPABILITY),
    }
}
