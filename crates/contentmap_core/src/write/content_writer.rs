//! Create-or-update writer mapping typed records back onto store nodes.
//!
//! # Responsibility
//! - Validate save preconditions before any store call.
//! - Map declared fields onto store aliases through write converters.
//! - Delete nodes permanently or into the recycle bin.
//!
//! # Invariants
//! - A failed precondition performs no store mutation.
//! - A single-field failure aborts the save; fields already written stay
//!   written (the save loop is not transactional).
//! - The assigned store id is written back onto the record.

use crate::convert::ConverterRegistry;
use crate::model::{FieldValue, NodeId, Record, UserId};
use crate::schema::{FieldDescriptor, TypeRegistry};
use crate::store::{ContentStore, StoreError};
use log::info;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Save precondition violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// No acting user supplied.
    MissingUser,
    /// Parent id must be a persisted node id (`>= 1`).
    InvalidParent(NodeId),
    /// Record name is blank after trim.
    EmptyName,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingUser => write!(f, "save requires an acting user"),
            Self::InvalidParent(id) => write!(f, "save requires parent id >= 1, got {id}"),
            Self::EmptyName => write!(f, "save requires a non-empty name"),
        }
    }
}

impl Error for ValidationError {}

/// Write-path failures.
#[derive(Debug)]
pub enum WriteError {
    /// Precondition violation; nothing was written.
    Validation(ValidationError),
    /// Declared field has no alias definition on the node type.
    Mapping {
        alias: String,
        node_id: NodeId,
        type_tag: String,
    },
    /// One field's write conversion or store write failed.
    Field {
        type_tag: String,
        field: String,
        cause: String,
    },
    /// Record's type tag has no registered descriptor.
    TypeNotRegistered(String),
    /// Load-for-update could not resolve the record's id.
    NotFound(NodeId),
    /// Store-layer failure.
    Store(StoreError),
}

impl Display for WriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Mapping {
                alias,
                node_id,
                type_tag,
            } => write!(
                f,
                "alias `{alias}` is not defined on type `{type_tag}` (node {node_id})"
            ),
            Self::Field {
                type_tag,
                field,
                cause,
            } => write!(
                f,
                "failed to write field `{field}` of type `{type_tag}`: {cause}"
            ),
            Self::TypeNotRegistered(tag) => write!(f, "type tag not registered: `{tag}`"),
            Self::NotFound(id) => write!(f, "store node not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WriteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for WriteError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for WriteError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NodeNotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Maps typed records back onto store nodes.
pub struct ContentWriter<'a, S: ContentStore> {
    store: &'a S,
    types: &'a TypeRegistry,
    converters: &'a ConverterRegistry,
}

impl<'a, S: ContentStore> ContentWriter<'a, S> {
    pub fn new(store: &'a S, types: &'a TypeRegistry, converters: &'a ConverterRegistry) -> Self {
        Self {
            store,
            types,
            converters,
        }
    }

    /// Creates or updates the store node behind one record.
    ///
    /// `publish=false` persists without publishing; `publish=true` persists
    /// and publishes. The assigned store id is written back onto the record
    /// and returned.
    pub fn save(
        &self,
        record: &mut Record,
        acting_user: Option<UserId>,
        publish: bool,
    ) -> Result<NodeId, WriteError> {
        let user = acting_user.ok_or(ValidationError::MissingUser)?;
        if record.system.parent_id < 1 {
            return Err(ValidationError::InvalidParent(record.system.parent_id).into());
        }
        let name = record.system.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let type_tag = record.system.type_tag.clone();
        let descriptor = self
            .types
            .get(&type_tag)
            .ok_or_else(|| WriteError::TypeNotRegistered(type_tag.clone()))?;

        let id = if record.id() == 0 {
            self.store
                .create_node(&name, record.system.parent_id, &type_tag, user)?
        } else {
            let id = record.id();
            self.store
                .get_node(id)?
                .ok_or(WriteError::NotFound(id))?;
            id
        };

        let aliases: BTreeSet<String> = self
            .store
            .type_field_aliases(&type_tag)?
            .into_iter()
            .collect();

        for field in descriptor.fields().iter().filter(|field| !field.overridable) {
            if !aliases.contains(&field.alias) {
                return Err(WriteError::Mapping {
                    alias: field.alias.clone(),
                    node_id: id,
                    type_tag,
                });
            }
            // Fields the record never carried stay untouched on the node.
            let Some(value) = record.get(&field.name) else {
                continue;
            };
            let raw = self
                .write_value(field, &value)
                .map_err(|cause| WriteError::Field {
                    type_tag: type_tag.clone(),
                    field: field.name.clone(),
                    cause,
                })?;
            self.store
                .set_field(id, &field.alias, &raw)
                .map_err(|err| WriteError::Field {
                    type_tag: type_tag.clone(),
                    field: field.name.clone(),
                    cause: err.to_string(),
                })?;
        }

        self.store.save_node(id, &name, user)?;
        if publish {
            self.store.publish_node(id)?;
        }
        record.system.id = id;

        info!(
            "event=content_save module=write status=ok node_id={id} type_tag={} publish={publish}",
            record.system.type_tag
        );
        Ok(id)
    }

    /// Deletes one node: outright when `permanent`, otherwise into the
    /// recycle bin. No cascading beyond what the store itself performs.
    pub fn delete(&self, id: NodeId, permanent: bool) -> Result<(), WriteError> {
        if permanent {
            self.store.delete_node(id)?;
        } else {
            self.store.move_to_recycle_bin(id)?;
        }
        info!("event=content_delete module=write status=ok node_id={id} permanent={permanent}");
        Ok(())
    }

    fn write_value(&self, field: &FieldDescriptor, value: &FieldValue) -> Result<String, String> {
        if let Some(name) = &field.converter {
            let converter = self
                .converters
                .named(name)
                .ok_or_else(|| format!("converter `{name}` not registered"))?;
            return converter.write(value);
        }
        if let Some(converter) = self.converters.for_kind(field.kind) {
            return converter.write(value);
        }
        Ok(value.to_raw())
    }
}
