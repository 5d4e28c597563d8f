//! Mapped typed record and its system fields.
//!
//! # Responsibility
//! - Hold the converted view of one store node: system fields, eagerly
//!   mapped field values and per-instance cache cells for deferred fields.
//!
//! # Invariants
//! - `system.id == 0` marks a record that is not yet persisted.
//! - System fields are always populated, even when declared fields fail.
//! - Lazy cache cells are instance-scoped and filled at most once.

use super::node::{NodeId, RawNode, UserId};
use super::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// System fields shared by every mapped record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemFields {
    pub id: NodeId,
    pub name: String,
    pub parent_id: NodeId,
    pub path: String,
    pub type_tag: String,
    pub template: String,
    pub url: String,
    pub sort_order: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub creator: UserId,
    pub writer: UserId,
    pub version: i64,
}

/// Typed view of one store node.
///
/// Eagerly mapped fields live in `eager`; overridable fields are computed on
/// first access through the mapper and cached in `lazy`. The source node stays
/// bound to the record so deferred conversion can run against it later.
#[derive(Debug, Clone)]
pub struct Record {
    /// Always-populated system fields.
    pub system: SystemFields,
    raw: RawNode,
    eager: BTreeMap<String, FieldValue>,
    lazy: RefCell<BTreeMap<String, FieldValue>>,
}

impl Record {
    /// Creates a record bound to a raw store node.
    pub(crate) fn bound(raw: RawNode, system: SystemFields) -> Self {
        Self {
            system,
            raw,
            eager: BTreeMap::new(),
            lazy: RefCell::new(BTreeMap::new()),
        }
    }

    /// Creates a fresh record that has not been persisted yet.
    ///
    /// `system.id` stays `0` until a writer assigns a store id.
    pub fn new_unsaved(
        type_tag: impl Into<String>,
        name: impl Into<String>,
        parent_id: NodeId,
    ) -> Self {
        let type_tag = type_tag.into();
        let system = SystemFields {
            name: name.into(),
            parent_id,
            type_tag: type_tag.clone(),
            version: 0,
            ..SystemFields::default()
        };
        let raw = RawNode {
            id: 0,
            type_tag,
            parent_id,
            path: String::new(),
            name: system.name.clone(),
            template: String::new(),
            url: String::new(),
            sort_order: 0,
            created_at: 0,
            updated_at: 0,
            creator: UserId::nil(),
            writer: UserId::nil(),
            version: 0,
            fields: BTreeMap::new(),
        };
        Self {
            system,
            raw,
            eager: BTreeMap::new(),
            lazy: RefCell::new(BTreeMap::new()),
        }
    }

    /// Store id, `0` when not yet persisted.
    pub fn id(&self) -> NodeId {
        self.system.id
    }

    /// The raw node this record was mapped from.
    pub fn raw(&self) -> &RawNode {
        &self.raw
    }

    /// Returns one field value without triggering deferred computation.
    ///
    /// Eager fields are always present after population; overridable fields
    /// show up here only once the mapper has computed and cached them.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        if let Some(value) = self.eager.get(name) {
            return Some(value.clone());
        }
        self.lazy.borrow().get(name).cloned()
    }

    /// Sets one eager field value.
    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.eager.insert(name.into(), value);
    }

    /// Iterates eagerly mapped fields in alias-stable order.
    pub fn eager_fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.eager.iter()
    }

    pub(crate) fn cached_lazy(&self, name: &str) -> Option<FieldValue> {
        self.lazy.borrow().get(name).cloned()
    }

    pub(crate) fn cache_lazy(&self, name: &str, value: FieldValue) {
        self.lazy.borrow_mut().insert(name.to_string(), value);
    }
}
