//! `INFO [section]`: daemon counters as name/value pairs.

use std::sync::Arc;

use warden_gate::{CommandHandler, HandlerResult, Invocation, Reply};

use super::internal_update::{InternalUpdateCounts, InternalUpdateStats};

/// Section holding the index replication counters.
const SEARCH_SECTION: &str = "search";

/// Handler for `INFO`.
///
/// With no argument, or the `search` section, the reply is a flat array
/// alternating counter names and values. Unknown sections reply with an
/// empty array.
#[derive(Debug, Clone)]
pub(crate) struct InfoCommand {
    stats: Arc<InternalUpdateStats>,
}

impl InfoCommand {
    pub(crate) fn new(stats: Arc<InternalUpdateStats>) -> Self {
        Self { stats }
    }
}

impl CommandHandler for InfoCommand {
    fn call(&self, invocation: &Invocation<'_>) -> HandlerResult {
        let wanted = invocation
            .args
            .first()
            .is_none_or(|section| section.eq_ignore_ascii_case(SEARCH_SECTION));
        if !wanted {
            return Ok(Reply::Array(Vec::new()));
        }
        Ok(Reply::Array(counter_pairs(self.stats.snapshot())))
    }
}

fn counter_pairs(counts: InternalUpdateCounts) -> Vec<Reply> {
    [
        ("internal_update_parse_failures", counts.parse_failures),
        ("internal_update_process_failures", counts.process_failures),
        ("internal_update_skipped_entries", counts.skipped_entries),
    ]
    .into_iter()
    .flat_map(|(name, value)| {
        [
            Reply::Bulk(name.to_owned()),
            Reply::Integer(i64::try_from(value).unwrap_or(i64::MAX)),
        ]
    })
    .collect()
}
