//! Parsing of `ACL SETUSER` rule tokens.

use std::str::FromStr;

use thiserror::Error;
use warden_gate::normalise_capability;

/// Capability categories a rule may name.
pub const KNOWN_CATEGORIES: &[&str] = &[
    "admin",
    "read",
    "write",
    "search",
    "fast",
    "slow",
    "dangerous",
    "connection",
];

/// Errors raised by the permission store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AclError {
    /// The token is not a recognised rule.
    #[error("Syntax error in rule '{rule}'")]
    InvalidRule {
        /// Offending token.
        rule: String,
    },
    /// The rule names a category that does not exist.
    #[error("Unknown command category in rule '{rule}'")]
    UnknownCategory {
        /// Offending token.
        rule: String,
    },
    /// A writer panicked while holding the store lock.
    #[error("permission store is unavailable")]
    Poisoned,
}

impl AclError {
    /// Rule token that caused the error, if any.
    #[must_use]
    pub fn rule(&self) -> Option<&str> {
        match self {
            Self::InvalidRule { rule } | Self::UnknownCategory { rule } => Some(rule),
            Self::Poisoned => None,
        }
    }
}

/// One modifier applied by `ACL SETUSER`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclRule {
    /// Enables the user.
    On,
    /// Disables the user.
    Off,
    /// Grants one capability category.
    Grant(String),
    /// Revokes one capability category.
    Revoke(String),
    /// Grants every known category.
    GrantAll,
    /// Revokes every category.
    RevokeAll,
}

impl FromStr for AclRule {
    type Err = AclError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let token = input.trim();
        if token.eq_ignore_ascii_case("on") {
            return Ok(Self::On);
        }
        if token.eq_ignore_ascii_case("off") {
            return Ok(Self::Off);
        }

        let (grant, category) = match (token.strip_prefix("+@"), token.strip_prefix("-@")) {
            (Some(category), _) => (true, category),
            (None, Some(category)) => (false, category),
            (None, None) => {
                return Err(AclError::InvalidRule {
                    rule: token.to_owned(),
                });
            }
        };

        let category = normalise_capability(category);
        if category == "all" {
            return Ok(if grant { Self::GrantAll } else { Self::RevokeAll });
        }
        if !KNOWN_CATEGORIES.contains(&category.as_str()) {
            return Err(AclError::UnknownCategory {
                rule: token.to_owned(),
            });
        }
        Ok(if grant {
            Self::Grant(category)
        } else {
            Self::Revoke(category)
        })
    }
}
