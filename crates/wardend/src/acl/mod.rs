//! In-process permission store and the `ACL` command.
//!
//! The store maps user names to an enabled flag and a set of capability
//! tags. It is the only shared mutable state the gate reads, and it is read
//! through [`PermissionSource`] on every request so grants and revocations
//! apply immediately.

mod command;
mod rules;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use tracing::{info, warn};
use warden_gate::{CallerPrincipal, PermissionSource};

pub(crate) use self::command::AclCommand;
pub use self::rules::{AclError, AclRule, KNOWN_CATEGORIES};

const ACL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::acl");

/// User every connection runs as unless a request names another.
pub const DEFAULT_USER: &str = "default";

/// Capabilities granted to [`DEFAULT_USER`] at startup.
pub const DEFAULT_CAPABILITIES: &[&str] = &["admin", "read", "write", "search"];

#[derive(Debug, Clone, Default)]
struct UserRecord {
    enabled: bool,
    capabilities: BTreeSet<String>,
}

impl UserRecord {
    fn apply(&mut self, rule: &AclRule) {
        match rule {
            AclRule::On => self.enabled = true,
            AclRule::Off => self.enabled = false,
            AclRule::Grant(tag) => {
                self.capabilities.insert(tag.clone());
            }
            AclRule::Revoke(tag) => {
                self.capabilities.remove(tag);
            }
            AclRule::GrantAll => self
                .capabilities
                .extend(KNOWN_CATEGORIES.iter().map(|tag| (*tag).to_owned())),
            AclRule::RevokeAll => self.capabilities.clear(),
        }
    }

    fn principal(&self, user: &str) -> CallerPrincipal {
        CallerPrincipal::new(user, &self.capabilities).with_enabled(self.enabled)
    }
}

/// Live permission grants keyed by user name.
#[derive(Debug)]
pub struct AclStore {
    users: RwLock<BTreeMap<String, UserRecord>>,
}

impl Default for AclStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AclStore {
    /// Creates a store holding only the enabled [`DEFAULT_USER`].
    #[must_use]
    pub fn new() -> Self {
        let default = UserRecord {
            enabled: true,
            capabilities: DEFAULT_CAPABILITIES
                .iter()
                .map(|tag| (*tag).to_owned())
                .collect(),
        };
        Self {
            users: RwLock::new(BTreeMap::from([(DEFAULT_USER.to_owned(), default)])),
        }
    }

    /// Applies `rules` to `user`, creating a disabled user with no
    /// capabilities first when it does not exist.
    ///
    /// Rules are parsed before any is applied, so a bad rule leaves the user
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns an [`AclError`] naming the first rule that fails to parse, or
    /// [`AclError::Poisoned`] when the store lock is poisoned.
    pub fn set_user<S: AsRef<str>>(&self, user: &str, rules: &[S]) -> Result<(), AclError> {
        let parsed = rules
            .iter()
            .map(|rule| rule.as_ref().parse::<AclRule>())
            .collect::<Result<Vec<_>, _>>()?;

        let mut users = self.users.write().map_err(|_| AclError::Poisoned)?;
        let record = users.entry(user.to_owned()).or_default();
        for rule in &parsed {
            record.apply(rule);
        }
        info!(
            target: ACL_TARGET,
            user,
            rules = parsed.len(),
            enabled = record.enabled,
            "acl user updated"
        );
        Ok(())
    }

    /// Current permissions of `user`, or `None` when the user is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`AclError::Poisoned`] when the store lock is poisoned.
    pub fn get_user(&self, user: &str) -> Result<Option<CallerPrincipal>, AclError> {
        let users = self.users.read().map_err(|_| AclError::Poisoned)?;
        Ok(users.get(user).map(|record| record.principal(user)))
    }

    /// Known user names in sorted order.
    ///
    /// # Errors
    ///
    /// Returns [`AclError::Poisoned`] when the store lock is poisoned.
    pub fn users(&self) -> Result<Vec<String>, AclError> {
        let users = self.users.read().map_err(|_| AclError::Poisoned)?;
        Ok(users.keys().cloned().collect())
    }
}

impl PermissionSource for AclStore {
    fn resolve(&self, user: &str) -> CallerPrincipal {
        match self.users.read() {
            Ok(users) => users.get(user).map_or_else(
                || CallerPrincipal::anonymous(user),
                |record| record.principal(user),
            ),
            Err(_) => {
                // Fail closed: a poisoned store grants nothing.
                warn!(target: ACL_TARGET, user, "acl store poisoned; denying access");
                CallerPrincipal::anonymous(user)
            }
        }
    }
}
