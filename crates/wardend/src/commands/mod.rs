//! Commands served behind the dispatch gate.
//!
//! [`build_registry`] is the single place that decides each command's arity,
//! tier and visibility. Everything registered here is reachable only through
//! [`warden_gate::DispatchGate`].

mod info;
mod internal_update;
mod search;

use std::sync::Arc;

use warden_gate::{Arity, CommandRegistry, CommandSpec, PrivilegeTier, RegistryError};

use crate::acl::{AclCommand, AclStore};

pub use self::internal_update::{
    InternalUpdateCounts, InternalUpdateStats, MetadataEntry, VersionHeader,
};
pub use self::search::{CatalogError, DEFAULT_ENCODING_VERSION, IndexCatalog, IndexEntry};

use self::info::InfoCommand;
use self::internal_update::InternalUpdateCommand;
use self::search::{
    CreateIndexCommand, DropIndexCommand, IndexInfoCommand, ListIndexesCommand, PingCommand,
};

const COMMANDS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::commands");

/// Shared state the command handlers operate on.
#[derive(Debug, Clone, Default)]
pub struct Services {
    /// Live permission store.
    pub acl: Arc<AclStore>,
    /// Index metadata.
    pub catalog: Arc<IndexCatalog>,
    /// Internal update failure counters.
    pub stats: Arc<InternalUpdateStats>,
    /// Acknowledge corrupted internal updates instead of failing them.
    pub skip_corrupted_entries: bool,
}

impl Services {
    /// Fresh services with the default ACL user and an empty catalog.
    #[must_use]
    pub fn new(skip_corrupted_entries: bool) -> Self {
        Self {
            skip_corrupted_entries,
            ..Self::default()
        }
    }
}

/// Builds the immutable command table over `services`.
///
/// # Errors
///
/// Returns a [`RegistryError`] if two commands share a name.
pub fn build_registry(services: &Services) -> Result<CommandRegistry, RegistryError> {
    let catalog = &services.catalog;
    let mut builder = CommandRegistry::builder();
    builder
        .register(CommandSpec::public(
            "PING",
            Arity::between(0, 1),
            PrivilegeTier::Normal,
            PingCommand,
        ))?
        .register(CommandSpec::public(
            "INFO",
            Arity::between(0, 1),
            PrivilegeTier::Normal,
            InfoCommand::new(Arc::clone(&services.stats)),
        ))?
        .register(CommandSpec::public(
            "FT.CREATE",
            Arity::at_least(1),
            PrivilegeTier::Normal,
            CreateIndexCommand::new(Arc::clone(catalog)),
        ))?
        .register(CommandSpec::public(
            "FT._LIST",
            Arity::exact(0),
            PrivilegeTier::Normal,
            ListIndexesCommand::new(Arc::clone(catalog)),
        ))?
        .register(CommandSpec::public(
            "FT.DROPINDEX",
            Arity::exact(1),
            PrivilegeTier::Normal,
            DropIndexCommand::new(Arc::clone(catalog)),
        ))?
        .register(CommandSpec::public(
            "FT.INFO",
            Arity::exact(1),
            PrivilegeTier::Normal,
            IndexInfoCommand::new(Arc::clone(catalog)),
        ))?
        .register(CommandSpec::public(
            "ACL",
            Arity::at_least(1),
            PrivilegeTier::Admin,
            AclCommand::new(Arc::clone(&services.acl)),
        ))?
        .register(CommandSpec::internal(
            "FT.INTERNAL_UPDATE",
            Arity::exact(3),
            InternalUpdateCommand::new(
                Arc::clone(catalog),
                Arc::clone(&services.stats),
                services.skip_corrupted_entries,
            ),
        ))?;
    Ok(builder.build())
}
