//! Immutable table of registered commands.
//!
//! Commands are collected in a [`RegistryBuilder`] at startup and frozen into
//! a [`CommandRegistry`]. Specs live in a flat arena addressed by index; the
//! name index maps lower-cased command names to arena slots.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::handler::CommandHandler;
use crate::resolver::PrivilegeTier;

/// Bounds on the number of arguments following the command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    min: usize,
    max: Option<usize>,
}

impl Arity {
    /// Exactly `count` arguments.
    #[must_use]
    pub const fn exact(count: usize) -> Self {
        Self {
            min: count,
            max: Some(count),
        }
    }

    /// At least `min` arguments, no upper bound.
    #[must_use]
    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Between `min` and `max` arguments inclusive.
    #[must_use]
    pub const fn between(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// Smallest accepted argument count.
    #[must_use]
    pub const fn min(self) -> usize {
        self.min
    }

    /// Largest accepted argument count, if bounded.
    #[must_use]
    pub const fn max(self) -> Option<usize> {
        self.max
    }

    /// Whether `count` arguments fall within the bounds.
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self.max {
            Some(max) => count >= self.min && count <= max,
            None => count >= self.min,
        }
    }

    const fn is_valid(self) -> bool {
        match self.max {
            Some(max) => max >= self.min,
            None => true,
        }
    }
}

/// Who may learn that a command exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Documented, user-facing command.
    Public,
    /// Used only by the system itself, for example replication.
    Internal,
}

/// Metadata and handler for one registered command.
#[derive(Clone)]
pub struct CommandSpec {
    name: String,
    arity: Arity,
    tier: PrivilegeTier,
    visibility: Visibility,
    handler: Arc<dyn CommandHandler>,
}

impl CommandSpec {
    /// A user-facing command requiring `tier`.
    pub fn public(
        name: impl Into<String>,
        arity: Arity,
        tier: PrivilegeTier,
        handler: impl CommandHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            tier,
            visibility: Visibility::Public,
            handler: Arc::new(handler),
        }
    }

    /// An internal-only command. Internal commands always require
    /// [`PrivilegeTier::Admin`].
    pub fn internal(
        name: impl Into<String>,
        arity: Arity,
        handler: impl CommandHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            tier: PrivilegeTier::Admin,
            visibility: Visibility::Internal,
            handler: Arc::new(handler),
        }
    }

    /// Canonical lower-case name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accepted argument counts.
    #[must_use]
    pub const fn arity(&self) -> Arity {
        self.arity
    }

    /// Required privilege tier.
    #[must_use]
    pub const fn tier(&self) -> PrivilegeTier {
        self.tier
    }

    /// Whether the command is public or internal.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the command is internal-only.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self.visibility, Visibility::Internal)
    }

    /// Handler invoked once the gate forwards a call.
    #[must_use]
    pub fn handler(&self) -> &dyn CommandHandler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("tier", &self.tier)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

/// Errors raised while registering commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A command with the same case-insensitive name is already registered.
    #[error("command '{name}' is already registered")]
    DuplicateCommand {
        /// Lower-cased conflicting name.
        name: String,
    },
    /// The command name is empty or contains whitespace.
    #[error("invalid command name '{name}'")]
    InvalidName {
        /// Name as supplied.
        name: String,
    },
    /// The maximum argument count is below the minimum.
    #[error("command '{name}' declares max arguments below min")]
    InvalidArity {
        /// Lower-cased command name.
        name: String,
    },
}

/// Collects command specs before the registry is frozen.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    specs: Vec<CommandSpec>,
    index: HashMap<String, usize>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateCommand`] when the name is taken
    /// under any casing, [`RegistryError::InvalidName`] for blank names or
    /// names with whitespace, and [`RegistryError::InvalidArity`] for
    /// inverted bounds.
    pub fn register(&mut self, mut spec: CommandSpec) -> Result<&mut Self, RegistryError> {
        if spec.name.is_empty() || spec.name.chars().any(char::is_whitespace) {
            return Err(RegistryError::InvalidName { name: spec.name });
        }
        let key = spec.name.to_ascii_lowercase();
        if !spec.arity.is_valid() {
            return Err(RegistryError::InvalidArity { name: key });
        }
        if self.index.contains_key(&key) {
            return Err(RegistryError::DuplicateCommand { name: key });
        }
        spec.name.clone_from(&key);
        self.index.insert(key, self.specs.len());
        self.specs.push(spec);
        Ok(self)
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> CommandRegistry {
        CommandRegistry {
            specs: self.specs,
            index: self.index,
        }
    }
}

/// Frozen, read-only command table.
#[derive(Debug)]
pub struct CommandRegistry {
    specs: Vec<CommandSpec>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Starts a new registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Finds a command by name, ignoring ASCII case.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&CommandSpec> {
        let slot = self.index.get(&name.to_ascii_lowercase())?;
        self.specs.get(*slot)
    }

    /// Number of registered commands.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether no commands are registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// All specs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.specs.iter()
    }
}
