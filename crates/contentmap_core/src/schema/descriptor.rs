//! Field and type descriptors declared by the caller.
//!
//! # Responsibility
//! - Describe how each declared field maps onto a store alias.
//! - Carry the conversion hints consumed by the field mapper.
//!
//! # Invariants
//! - Descriptors are built once at registration time and read thereafter;
//!   there is no runtime introspection.
//! - One declared field maps to exactly one alias.

use crate::model::{FieldValue, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared semantic type of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Boolean,
    Integer,
    Decimal,
    /// Epoch ms timestamp.
    Date,
    /// Markup kept verbatim, never escaped.
    Markup,
}

impl FieldKind {
    /// Short label used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::Markup => "markup",
        }
    }
}

/// Accessor hook for one overridable field.
///
/// The hook receives the record and the base converted value and may extend
/// or replace it. The interceptor caches whatever the hook returns.
pub type FieldOverride = fn(&Record, Option<FieldValue>) -> Option<FieldValue>;

/// Mapping metadata for one declared field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// In-memory field name.
    pub name: String,
    /// Store-side alias holding the raw value.
    pub alias: String,
    /// Declared semantic type.
    pub kind: FieldKind,
    /// Nullable wrapper over a primitive: empty raw maps to `Null`.
    pub nullable: bool,
    /// Named converter registered in the converter registry.
    pub converter: Option<String>,
    /// Deferred computation: skipped by eager population, computed on first
    /// access through interception.
    pub overridable: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, alias: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            kind,
            nullable: false,
            converter: None,
            overridable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_converter(mut self, converter: impl Into<String>) -> Self {
        self.converter = Some(converter.into());
        self
    }

    pub fn overridable(mut self) -> Self {
        self.overridable = true;
        self
    }
}

/// Full descriptor set for one declared target type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Store type tag this descriptor maps.
    pub type_tag: String,
    fields: Vec<FieldDescriptor>,
    overrides: BTreeMap<String, FieldOverride>,
}

impl TypeDescriptor {
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            fields: Vec::new(),
            overrides: BTreeMap::new(),
        }
    }

    /// Adds one field descriptor, keeping declaration order.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Registers an accessor hook for one overridable field.
    pub fn with_override(mut self, field_name: impl Into<String>, hook: FieldOverride) -> Self {
        self.overrides.insert(field_name.into(), hook);
        self
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up one descriptor by field name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Looks up one descriptor by store alias.
    pub fn field_by_alias(&self, alias: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.alias == alias)
    }

    /// Returns the accessor hook for one field, when registered.
    pub fn override_for(&self, name: &str) -> Option<FieldOverride> {
        self.overrides.get(name).copied()
    }
}
