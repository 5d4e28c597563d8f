//! Content-store collaborator boundary.
//!
//! # Responsibility
//! - Define the CRUD and query contract the mapping core depends on.
//! - Ship a SQLite reference implementation for tests and embedding.
//!
//! # Invariants
//! - Lookups for missing nodes yield `Ok(None)`, never an error.
//! - Parent resolution failures surface as `Ok(None)` ("no parent").

pub mod sqlite;

pub use sqlite::SqliteContentStore;

use crate::convert::MarkupSource;
use crate::db::DbError;
use crate::model::{NodeId, RawNode, UserId};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer failures.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Referenced node does not exist.
    NodeNotFound(NodeId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NodeNotFound(id) => write!(f, "store node not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "content store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "content store requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid store data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// CRUD and query contract the mapping core depends on.
///
/// The store is tree-shaped: every node has a parent, a delimited ancestor
/// path, a type tag, and a bag of raw string field values keyed by alias.
pub trait ContentStore {
    /// Loads one node by id; missing ids yield `Ok(None)`.
    fn get_node(&self, id: NodeId) -> StoreResult<Option<RawNode>>;
    /// Creates one node under a parent and returns the assigned id.
    fn create_node(
        &self,
        name: &str,
        parent_id: NodeId,
        type_tag: &str,
        user: UserId,
    ) -> StoreResult<NodeId>;
    /// Sets one raw field value by alias.
    fn set_field(&self, id: NodeId, alias: &str, value: &str) -> StoreResult<()>;
    /// Persists pending node state: name, writer identity, version bump.
    fn save_node(&self, id: NodeId, name: &str, user: UserId) -> StoreResult<()>;
    /// Marks one node published.
    fn publish_node(&self, id: NodeId) -> StoreResult<()>;
    /// Removes one node and its subtree outright.
    fn delete_node(&self, id: NodeId) -> StoreResult<()>;
    /// Moves one node (and subtree) under the recycle-bin container.
    fn move_to_recycle_bin(&self, id: NodeId) -> StoreResult<()>;
    /// Enumerable alias definitions for one node type.
    fn type_field_aliases(&self, type_tag: &str) -> StoreResult<Vec<String>>;
    /// Direct children of one node in traversal order.
    fn children_of(&self, id: NodeId) -> StoreResult<Vec<RawNode>>;
    /// Parent of one node; unresolvable parents yield `Ok(None)`.
    fn parent_of(&self, node: &RawNode) -> StoreResult<Option<RawNode>>;
    /// Full-tree snapshot for structural queries.
    fn snapshot(&self) -> StoreResult<Vec<RawNode>>;
    /// Markup fragment for one node/alias, when the store holds one.
    fn markup_fragment(&self, id: NodeId, alias: &str) -> StoreResult<Option<String>>;
}

/// Adapts a content store into the mapper's best-effort markup source.
///
/// Lookup failures degrade to "no fragment" with a warning; the fallback
/// must never abort a mapping pass.
pub struct StoreMarkup<'a, S: ContentStore + ?Sized>(pub &'a S);

impl<S: ContentStore + ?Sized> MarkupSource for StoreMarkup<'_, S> {
    fn markup_fragment(&self, node_id: NodeId, alias: &str) -> Option<String> {
        match self.0.markup_fragment(node_id, alias) {
            Ok(fragment) => fragment,
            Err(err) => {
                warn!(
                    "event=markup_lookup module=store status=error node_id={node_id} alias={alias} error={err}"
                );
                None
            }
        }
    }
}
