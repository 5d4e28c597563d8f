//! Type-tag registry mapping store tags to declared type descriptors.
//!
//! # Responsibility
//! - Validate and hold one descriptor per type tag.
//! - Serve read-only lookups after start-up registration.
//!
//! # Invariants
//! - Type tags are unique.
//! - Aliases are unique within one type.
//! - Registration happens before first mapping use; readers never mutate.

use super::descriptor::TypeDescriptor;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Schema registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Type tag is blank after trim.
    InvalidTypeTag(String),
    /// Type tag already registered.
    DuplicateTypeTag(String),
    /// Field name is blank, or declared twice for one type.
    InvalidField { type_tag: String, name: String },
    /// Two declared fields map onto one alias.
    DuplicateAlias { type_tag: String, alias: String },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTypeTag(value) => write!(f, "type tag is invalid: `{value}`"),
            Self::DuplicateTypeTag(value) => write!(f, "type tag already registered: `{value}`"),
            Self::InvalidField { type_tag, name } => {
                write!(f, "invalid field `{name}` on type `{type_tag}`")
            }
            Self::DuplicateAlias { type_tag, alias } => {
                write!(f, "duplicate alias `{alias}` on type `{type_tag}`")
            }
        }
    }
}

impl Error for SchemaError {}

/// Registry of declared types keyed by store type tag.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one type descriptor.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<(), SchemaError> {
        let type_tag = descriptor.type_tag.trim().to_string();
        if type_tag.is_empty() {
            return Err(SchemaError::InvalidTypeTag(descriptor.type_tag));
        }
        if self.types.contains_key(type_tag.as_str()) {
            return Err(SchemaError::DuplicateTypeTag(type_tag));
        }

        let mut names = BTreeSet::new();
        let mut aliases = BTreeSet::new();
        for field in descriptor.fields() {
            if field.name.trim().is_empty() || !names.insert(field.name.clone()) {
                return Err(SchemaError::InvalidField {
                    type_tag,
                    name: field.name.clone(),
                });
            }
            if !aliases.insert(field.alias.clone()) {
                return Err(SchemaError::DuplicateAlias {
                    type_tag,
                    alias: field.alias.clone(),
                });
            }
        }

        self.types.insert(type_tag, descriptor);
        Ok(())
    }

    /// Looks up one descriptor by type tag.
    pub fn get(&self, type_tag: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_tag.trim())
    }

    /// Returns sorted registered type tags.
    pub fn type_tags(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
