//! `FT.INTERNAL_UPDATE`: cluster metadata replay.
//!
//! The command is registered as internal, so the gate only forwards it for
//! callers holding the admin capability. Once forwarded it parses the
//! metadata entry and version header, then upserts the catalog entry.
//! Parse and apply failures are counted; with `skip_corrupted_entries`
//! they are acknowledged with `OK` so replay can continue.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use warden_gate::{CommandHandler, HandlerError, HandlerResult, Invocation, Reply};

use super::COMMANDS_TARGET;
use super::search::IndexCatalog;

/// Replicated metadata for one index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataEntry {
    /// Monotonic entry version.
    pub version: u64,
    /// Version of the encoding used for the entry.
    pub encoding_version: u32,
    /// Fingerprint of the entry contents.
    pub fingerprint: u64,
    /// Schema tokens; absent when only the version moves.
    #[serde(default)]
    pub schema: Option<Vec<String>>,
}

/// Version of the whole metadata set the entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VersionHeader {
    /// Version of the top-level metadata.
    pub top_level_version: u64,
    /// Fingerprint of the top-level metadata.
    pub top_level_fingerprint: u64,
}

/// Failure counters for internal updates.
#[derive(Debug, Default)]
pub struct InternalUpdateStats {
    parse_failures: AtomicU64,
    process_failures: AtomicU64,
    skipped_entries: AtomicU64,
}

/// Point-in-time copy of [`InternalUpdateStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InternalUpdateCounts {
    /// Entries or headers that failed to parse.
    pub parse_failures: u64,
    /// Parsed entries the catalog refused.
    pub process_failures: u64,
    /// Failures acknowledged because skipping is enabled.
    pub skipped_entries: u64,
}

impl InternalUpdateStats {
    /// Current counter values.
    #[must_use]
    pub fn snapshot(&self) -> InternalUpdateCounts {
        InternalUpdateCounts {
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            process_failures: self.process_failures.load(Ordering::Relaxed),
            skipped_entries: self.skipped_entries.load(Ordering::Relaxed),
        }
    }
}

enum Failure {
    Parse,
    Process,
}

/// Handler for `FT.INTERNAL_UPDATE id metadata header`.
#[derive(Debug, Clone)]
pub(crate) struct InternalUpdateCommand {
    catalog: Arc<IndexCatalog>,
    stats: Arc<InternalUpdateStats>,
    skip_corrupted_entries: bool,
}

impl InternalUpdateCommand {
    pub(crate) fn new(
        catalog: Arc<IndexCatalog>,
        stats: Arc<InternalUpdateStats>,
        skip_corrupted_entries: bool,
    ) -> Self {
        Self {
            catalog,
            stats,
            skip_corrupted_entries,
        }
    }

    fn fail(&self, failure: Failure, id: &str, error: HandlerError) -> HandlerResult {
        let counter = match failure {
            Failure::Parse => &self.stats.parse_failures,
            Failure::Process => &self.stats.process_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        warn!(
            target: COMMANDS_TARGET,
            index = id,
            error = error.message(),
            "internal update failed"
        );

        if self.skip_corrupted_entries {
            self.stats.skipped_entries.fetch_add(1, Ordering::Relaxed);
            warn!(target: COMMANDS_TARGET, index = id, "skipping corrupted entry");
            return Ok(Reply::ok());
        }
        Err(error)
    }
}

impl CommandHandler for InternalUpdateCommand {
    fn call(&self, invocation: &Invocation<'_>) -> HandlerResult {
        let [id, metadata, header] = invocation.args else {
            return Err(HandlerError::new(
                "ERR wrong number of arguments for 'ft.internal_update' command",
            ));
        };

        let entry = match serde_json::from_str::<MetadataEntry>(metadata) {
            Ok(entry) => entry,
            Err(error) => {
                debug!(
                    target: COMMANDS_TARGET,
                    index = %id,
                    bytes = metadata.len(),
                    %error,
                    "metadata entry rejected"
                );
                return self.fail(
                    Failure::Parse,
                    id,
                    HandlerError::new("ERR failed to parse GlobalMetadataEntry"),
                );
            }
        };
        let header = match serde_json::from_str::<VersionHeader>(header) {
            Ok(header) => header,
            Err(error) => {
                debug!(
                    target: COMMANDS_TARGET,
                    index = %id,
                    bytes = header.len(),
                    %error,
                    "version header rejected"
                );
                return self.fail(
                    Failure::Parse,
                    id,
                    HandlerError::new("ERR failed to parse GlobalMetadataVersionHeader"),
                );
            }
        };

        if let Err(error) = self.catalog.upsert(
            id,
            entry.version,
            entry.fingerprint,
            entry.encoding_version,
            entry.schema,
        ) {
            return self.fail(Failure::Process, id, error.into());
        }
        debug!(
            target: COMMANDS_TARGET,
            index = %id,
            version = entry.version,
            top_level_version = header.top_level_version,
            "internal update applied"
        );
        Ok(Reply::ok())
    }
}
