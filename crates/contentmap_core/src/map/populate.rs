//! Eager record population from one raw node.
//!
//! # Responsibility
//! - Write all system fields off the raw node.
//! - Map every non-overridable declared field through the field mapper.
//!
//! # Invariants
//! - System-field population never fails; an unresolvable parent becomes
//!   parent id `0`.
//! - One declared field's conversion failure aborts the whole population.
//! - Overridable fields are left to the interceptor.

use crate::convert::{ConversionError, ConverterRegistry, FieldMapper};
use crate::model::{RawNode, Record, SystemFields};
use crate::schema::{FieldKind, TypeDescriptor};
use crate::store::{ContentStore, StoreMarkup};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Population failure on one declared field, with the owning type context.
#[derive(Debug)]
pub struct PopulateError {
    /// Type tag of the owning declared type.
    pub type_tag: String,
    /// Field that failed.
    pub field: String,
    /// Raw value that was being converted.
    pub raw: String,
    /// Declared kind of the failing field.
    pub kind: FieldKind,
    /// Underlying conversion failure.
    pub source: ConversionError,
}

impl Display for PopulateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to populate type `{}` field `{}` (kind {}) from value `{}`: {}",
            self.type_tag,
            self.field,
            self.kind.label(),
            self.raw,
            self.source
        )
    }
}

impl Error for PopulateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Walks all eagerly-mapped fields of a target type.
pub struct NodePopulator<'a, S: ContentStore + ?Sized> {
    store: &'a S,
    converters: &'a ConverterRegistry,
}

impl<'a, S: ContentStore + ?Sized> NodePopulator<'a, S> {
    pub fn new(store: &'a S, converters: &'a ConverterRegistry) -> Self {
        Self { store, converters }
    }

    /// Populates one activated record from a raw node.
    ///
    /// Returns `Ok(false)` without mutating the record when the node is
    /// absent, has no type tag, or carries the unresolved id `0`.
    pub fn populate(
        &self,
        raw: Option<&RawNode>,
        descriptor: &TypeDescriptor,
        record: &mut Record,
    ) -> Result<bool, PopulateError> {
        let Some(raw) = raw else {
            return Ok(false);
        };
        if !raw.is_resolvable() {
            return Ok(false);
        }

        record.system = self.system_fields(raw);

        let mapper = FieldMapper::new(self.converters);
        let markup = StoreMarkup(self.store);
        for field in descriptor.fields() {
            if field.overridable {
                continue;
            }
            let value = mapper
                .read_field(raw, field, &markup)
                .map_err(|source| PopulateError {
                    type_tag: descriptor.type_tag.clone(),
                    field: field.name.clone(),
                    // The mapper may have been converting a markup fragment
                    // rather than the stored raw value.
                    raw: source.raw.clone(),
                    kind: field.kind,
                    source,
                })?;
            record.set(field.name.clone(), value);
        }

        Ok(true)
    }

    fn system_fields(&self, raw: &RawNode) -> SystemFields {
        // Best effort only; a lookup failure means "no parent", never an error.
        let parent_id = match self.store.parent_of(raw) {
            Ok(Some(parent)) => parent.id,
            Ok(None) => 0,
            Err(err) => {
                debug!(
                    "event=parent_lookup module=map status=unresolved node_id={} error={}",
                    raw.id, err
                );
                0
            }
        };

        SystemFields {
            id: raw.id,
            name: raw.name.clone(),
            parent_id,
            path: raw.path.clone(),
            type_tag: raw.type_tag.clone(),
            template: raw.template.clone(),
            url: raw.url.clone(),
            sort_order: raw.sort_order,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            creator: raw.creator,
            writer: raw.writer,
            version: raw.version,
        }
    }
}
