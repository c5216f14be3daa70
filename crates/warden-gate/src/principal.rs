//! Caller identities and the capability tags they hold.

use std::collections::BTreeSet;

/// Capability tag granting access to administrative and internal commands.
pub const ADMIN_CAPABILITY: &str = "admin";

/// Effective permissions of the caller behind a single request.
///
/// A principal is a snapshot taken from the permission store for one
/// invocation. It is never cached between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerPrincipal {
    user: String,
    enabled: bool,
    capabilities: BTreeSet<String>,
}

impl CallerPrincipal {
    /// Creates an enabled principal holding the given capability tags.
    ///
    /// Tags are stored lower-cased without a leading `@`.
    #[must_use]
    pub fn new<I, S>(user: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            user: user.into(),
            enabled: true,
            capabilities: capabilities
                .into_iter()
                .map(|tag| normalise_capability(tag.as_ref()))
                .collect(),
        }
    }

    /// Principal for a user the permission store does not know.
    ///
    /// It is disabled and holds nothing, so it satisfies no tier.
    #[must_use]
    pub fn anonymous(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            enabled: false,
            capabilities: BTreeSet::new(),
        }
    }

    /// Returns a copy with the enabled flag replaced.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// User name the request runs as.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Whether the user may run commands at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the principal explicitly holds `tag`.
    #[must_use]
    pub fn has_capability(&self, tag: &str) -> bool {
        self.capabilities.contains(&normalise_capability(tag))
    }

    /// Capability tags in sorted order.
    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.capabilities.iter().map(String::as_str)
    }
}

/// Canonical form of a capability tag: trimmed, lower-case, no `@` prefix.
#[must_use]
pub fn normalise_capability(tag: &str) -> String {
    tag.trim().trim_start_matches('@').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_match_regardless_of_prefix_and_case() {
        let principal = CallerPrincipal::new("default", ["@Admin", "search"]);
        assert!(principal.has_capability("admin"));
        assert!(principal.has_capability("@ADMIN"));
        assert!(principal.has_capability("Search"));
        assert!(!principal.has_capability("write"));
    }

    #[test]
    fn anonymous_principal_is_disabled_and_empty() {
        let principal = CallerPrincipal::anonymous("ghost");
        assert!(!principal.is_enabled());
        assert_eq!(principal.capabilities().count(), 0);
    }
}
