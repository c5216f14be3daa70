//! In-memory index catalog and the public `FT.*` commands over it.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::info;
use warden_gate::{CommandHandler, HandlerError, HandlerResult, Invocation, Reply};

use super::COMMANDS_TARGET;

/// Encoding version stamped on indexes created through `FT.CREATE`.
pub const DEFAULT_ENCODING_VERSION: u32 = 1;

/// Stored metadata for one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Schema tokens following the index name in `FT.CREATE`.
    pub schema: Vec<String>,
    /// Monotonic metadata version.
    pub version: u64,
    /// Fingerprint of the serialised metadata.
    pub fingerprint: u64,
    /// Version of the metadata encoding.
    pub encoding_version: u32,
}

/// Failures raised by catalog operations.
///
/// The display text is the wire message without its `ERR` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// `FT.CREATE` named an existing index.
    #[error("Index already exists")]
    AlreadyExists {
        /// Index name.
        name: String,
    },
    /// The named index does not exist.
    #[error("Index with name '{name}' not found")]
    NotFound {
        /// Index name.
        name: String,
    },
    /// An update carried an older version than the stored entry.
    #[error("stale metadata version {incoming} for index '{name}' (current {current})")]
    StaleVersion {
        /// Index name.
        name: String,
        /// Version already stored.
        current: u64,
        /// Version carried by the update.
        incoming: u64,
    },
    /// A writer panicked while holding the catalog lock.
    #[error("index catalog is unavailable")]
    Poisoned,
}

impl From<CatalogError> for HandlerError {
    fn from(error: CatalogError) -> Self {
        Self::new(format!("ERR {error}"))
    }
}

/// Index metadata keyed by index name.
#[derive(Debug, Default)]
pub struct IndexCatalog {
    indexes: RwLock<BTreeMap<String, IndexEntry>>,
}

impl IndexCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new index at version zero.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::AlreadyExists`] when the name is taken.
    pub fn create(&self, name: &str, schema: Vec<String>) -> Result<(), CatalogError> {
        let mut indexes = self.indexes.write().map_err(|_| CatalogError::Poisoned)?;
        if indexes.contains_key(name) {
            return Err(CatalogError::AlreadyExists {
                name: name.to_owned(),
            });
        }
        indexes.insert(
            name.to_owned(),
            IndexEntry {
                schema,
                version: 0,
                fingerprint: 0,
                encoding_version: DEFAULT_ENCODING_VERSION,
            },
        );
        info!(target: COMMANDS_TARGET, index = name, "index created");
        Ok(())
    }

    /// Removes an index.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the index does not exist.
    pub fn drop_index(&self, name: &str) -> Result<(), CatalogError> {
        let mut indexes = self.indexes.write().map_err(|_| CatalogError::Poisoned)?;
        if indexes.remove(name).is_none() {
            return Err(CatalogError::NotFound {
                name: name.to_owned(),
            });
        }
        info!(target: COMMANDS_TARGET, index = name, "index dropped");
        Ok(())
    }

    /// Sorted index names.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Poisoned`] when the catalog lock is poisoned.
    pub fn names(&self) -> Result<Vec<String>, CatalogError> {
        let indexes = self.indexes.read().map_err(|_| CatalogError::Poisoned)?;
        Ok(indexes.keys().cloned().collect())
    }

    /// Copy of the stored entry for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the index does not exist.
    pub fn get(&self, name: &str) -> Result<IndexEntry, CatalogError> {
        let indexes = self.indexes.read().map_err(|_| CatalogError::Poisoned)?;
        indexes
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                name: name.to_owned(),
            })
    }

    /// Inserts or replaces an entry, refusing to move its version backwards.
    ///
    /// An entry without a schema keeps the stored one.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StaleVersion`] when `version` is older than
    /// the stored version.
    pub fn upsert(
        &self,
        name: &str,
        version: u64,
        fingerprint: u64,
        encoding_version: u32,
        schema: Option<Vec<String>>,
    ) -> Result<(), CatalogError> {
        let mut indexes = self.indexes.write().map_err(|_| CatalogError::Poisoned)?;
        let current = indexes.get(name);
        if let Some(current) = current
            && version < current.version
        {
            return Err(CatalogError::StaleVersion {
                name: name.to_owned(),
                current: current.version,
                incoming: version,
            });
        }
        let schema = schema
            .or_else(|| current.map(|entry| entry.schema.clone()))
            .unwrap_or_default();
        indexes.insert(
            name.to_owned(),
            IndexEntry {
                schema,
                version,
                fingerprint,
                encoding_version,
            },
        );
        Ok(())
    }
}

fn single_arg<'a>(invocation: &'a Invocation<'_>) -> Result<&'a str, HandlerError> {
    match invocation.args {
        [name] => Ok(name.as_str()),
        _ => Err(HandlerError::new(format!(
            "ERR wrong number of arguments for '{}' command",
            invocation.command
        ))),
    }
}

fn integer<T: TryInto<i64>>(value: T) -> Reply {
    Reply::Integer(value.try_into().unwrap_or(i64::MAX))
}

/// `PING [message]`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PingCommand;

impl CommandHandler for PingCommand {
    fn call(&self, invocation: &Invocation<'_>) -> HandlerResult {
        Ok(match invocation.args.first() {
            Some(message) => Reply::Bulk(message.clone()),
            None => Reply::Status("PONG".to_owned()),
        })
    }
}

/// `FT.CREATE name [schema...]`.
#[derive(Debug, Clone)]
pub(crate) struct CreateIndexCommand {
    catalog: Arc<IndexCatalog>,
}

impl CreateIndexCommand {
    pub(crate) fn new(catalog: Arc<IndexCatalog>) -> Self {
        Self { catalog }
    }
}

impl CommandHandler for CreateIndexCommand {
    fn call(&self, invocation: &Invocation<'_>) -> HandlerResult {
        let Some((name, schema)) = invocation.args.split_first() else {
            return Err(HandlerError::new(
                "ERR wrong number of arguments for 'ft.create' command",
            ));
        };
        self.catalog.create(name, schema.to_vec())?;
        Ok(Reply::ok())
    }
}

/// `FT._LIST`.
#[derive(Debug, Clone)]
pub(crate) struct ListIndexesCommand {
    catalog: Arc<IndexCatalog>,
}

impl ListIndexesCommand {
    pub(crate) fn new(catalog: Arc<IndexCatalog>) -> Self {
        Self { catalog }
    }
}

impl CommandHandler for ListIndexesCommand {
    fn call(&self, _invocation: &Invocation<'_>) -> HandlerResult {
        Ok(Reply::strings(self.catalog.names()?))
    }
}

/// `FT.DROPINDEX name`.
#[derive(Debug, Clone)]
pub(crate) struct DropIndexCommand {
    catalog: Arc<IndexCatalog>,
}

impl DropIndexCommand {
    pub(crate) fn new(catalog: Arc<IndexCatalog>) -> Self {
        Self { catalog }
    }
}

impl CommandHandler for DropIndexCommand {
    fn call(&self, invocation: &Invocation<'_>) -> HandlerResult {
        self.catalog.drop_index(single_arg(invocation)?)?;
        Ok(Reply::ok())
    }
}

/// `FT.INFO name`.
#[derive(Debug, Clone)]
pub(crate) struct IndexInfoCommand {
    catalog: Arc<IndexCatalog>,
}

impl IndexInfoCommand {
    pub(crate) fn new(catalog: Arc<IndexCatalog>) -> Self {
        Self { catalog }
    }
}

impl CommandHandler for IndexInfoCommand {
    fn call(&self, invocation: &Invocation<'_>) -> HandlerResult {
        let name = single_arg(invocation)?;
        let entry = self.catalog.get(name)?;
        Ok(Reply::Array(vec![
            Reply::Bulk("index_name".to_owned()),
            Reply::Bulk(name.to_owned()),
            Reply::Bulk("version".to_owned()),
            integer(entry.version),
            Reply::Bulk("fingerprint".to_owned()),
            integer(entry.fingerprint),
            Reply::Bulk("encoding_version".to_owned()),
            integer(entry.encoding_version),
            Reply::Bulk("attributes".to_owned()),
            Reply::strings(entry.schema),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use warden_gate::CallerPrincipal;

    use super::*;

    fn run(handler: &dyn CommandHandler, command: &str, args: &[&str]) -> HandlerResult {
        let args: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
        let caller = CallerPrincipal::new("default", ["read", "write", "search"]);
        handler.call(&Invocation {
            command,
            args: &args,
            caller: &caller,
        })
    }

    #[fixture]
    fn catalog() -> Arc<IndexCatalog> {
        Arc::new(IndexCatalog::new())
    }

    #[rstest]
    fn create_list_and_drop(catalog: Arc<IndexCatalog>) {
        let create = CreateIndexCommand::new(Arc::clone(&catalog));
        let list = ListIndexesCommand::new(Arc::clone(&catalog));
        let drop_index = DropIndexCommand::new(Arc::clone(&catalog));

        assert_eq!(
            run(&create, "ft.create", &["idx", "SCHEMA", "title", "TEXT"]),
            Ok(Reply::ok())
        );
        assert_eq!(run(&list, "ft._list", &[]), Ok(Reply::strings(["idx"])));
        assert_eq!(run(&drop_index, "ft.dropindex", &["idx"]), Ok(Reply::ok()));
        assert_eq!(
            run(&list, "ft._list", &[]),
            Ok(Reply::strings(Vec::<String>::new()))
        );
    }

    #[rstest]
    fn duplicate_create_is_rejected(catalog: Arc<IndexCatalog>) {
        let create = CreateIndexCommand::new(catalog);
        run(&create, "ft.create", &["idx"]).expect("first create");
        let error = run(&create, "ft.create", &["idx"]).expect_err("duplicate");
        assert_eq!(error.message(), "ERR Index already exists");
    }

    #[rstest]
    fn dropping_a_missing_index_names_it(catalog: Arc<IndexCatalog>) {
        let error = run(&DropIndexCommand::new(catalog), "ft.dropindex", &["ghost"])
            .expect_err("missing index");
        assert_eq!(error.message(), "ERR Index with name 'ghost' not found");
    }

    #[rstest]
    fn info_reports_version_and_schema(catalog: Arc<IndexCatalog>) {
        catalog
            .create("idx", vec!["SCHEMA".to_owned(), "v".to_owned()])
            .expect("create");
        let reply = run(&IndexInfoCommand::new(catalog), "ft.info", &["idx"]).expect("info");
        let Reply::Array(fields) = reply else {
            panic!("expected array reply");
        };
        assert_eq!(fields.get(3), Some(&Reply::Integer(0)));
        assert_eq!(fields.last(), Some(&Reply::strings(["SCHEMA", "v"])));
    }

    #[rstest]
    #[case::bare(&[], Reply::Status("PONG".to_owned()))]
    #[case::echo(&["hello"], Reply::Bulk("hello".to_owned()))]
    fn ping_replies(#[case] args: &[&str], #[case] expected: Reply) {
        assert_eq!(run(&PingCommand, "ping", args), Ok(expected));
    }

    #[rstest]
    fn upsert_refuses_older_versions(catalog: Arc<IndexCatalog>) {
        catalog.upsert("idx", 5, 11, 1, None).expect("first upsert");
        catalog
            .upsert("idx", 5, 12, 1, Some(vec!["a".to_owned()]))
            .expect("same version is accepted");
        let error = catalog.upsert("idx", 4, 13, 1, None).expect_err("stale");
        assert!(matches!(
            error,
            CatalogError::StaleVersion {
                current: 5,
                incoming: 4,
                ..
            }
        ));
        let entry = catalog.get("idx").expect("entry");
        assert_eq!(entry.fingerprint, 12);
        assert_eq!(entry.schema, vec!["a".to_owned()]);
    }
}
