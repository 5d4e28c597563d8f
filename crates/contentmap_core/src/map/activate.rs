//! Instance activation and deferred field interception.
//!
//! # Responsibility
//! - Produce record instances with ordinary storage for eager fields and
//!   cache cells for overridable fields.
//! - Compute overridable fields on first access through the same
//!   conversion path eager population uses.
//!
//! # Invariants
//! - A field's cache cell is filled at most once per instance.
//! - The accessor hook always receives the base converted value.

use crate::convert::{ConversionError, ConverterRegistry, FieldMapper};
use crate::model::{FieldValue, RawNode, Record, SystemFields};
use crate::schema::{FieldDescriptor, TypeDescriptor};
use crate::store::{ContentStore, StoreMarkup};

/// Produces interception-capable record instances.
///
/// There is no runtime type generation: a record stores eager fields in
/// plain slots and overridable fields in per-instance cache cells, driven
/// purely by the type's field descriptors.
pub struct InstanceActivator;

impl InstanceActivator {
    /// Activates a fresh record bound to a raw node.
    ///
    /// System fields stay at their defaults until population runs.
    pub fn activate(raw: RawNode) -> Record {
        Record::bound(raw, SystemFields::default())
    }
}

/// Computes overridable fields on first access.
pub struct LazyFieldInterceptor<'a, S: ContentStore + ?Sized> {
    store: &'a S,
    converters: &'a ConverterRegistry,
}

impl<'a, S: ContentStore + ?Sized> LazyFieldInterceptor<'a, S> {
    pub fn new(store: &'a S, converters: &'a ConverterRegistry) -> Self {
        Self { store, converters }
    }

    /// Returns the field value, computing and caching it on first access.
    ///
    /// The base value comes from the same field-mapper path eager fields
    /// use, evaluated against the record's bound raw node. When the type
    /// registers an accessor hook for the field, the hook receives the base
    /// value and its result is what gets cached.
    pub fn intercept(
        &self,
        record: &Record,
        descriptor: &TypeDescriptor,
        field: &FieldDescriptor,
    ) -> Result<FieldValue, ConversionError> {
        if let Some(cached) = record.cached_lazy(&field.name) {
            return Ok(cached);
        }

        let mapper = FieldMapper::new(self.converters);
        let markup = StoreMarkup(self.store);
        let base = mapper.read_field(record.raw(), field, &markup)?;
        let base = if base.is_null() { None } else { Some(base) };

        let value = match descriptor.override_for(&field.name) {
            Some(hook) => hook(record, base),
            None => base,
        }
        .unwrap_or(FieldValue::Null);

        record.cache_lazy(&field.name, value.clone());
        Ok(value)
    }
}
