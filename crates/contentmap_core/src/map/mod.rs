//! Node-to-record mapping: eager population and deferred field access.

pub mod activate;
pub mod populate;

pub use activate::{InstanceActivator, LazyFieldInterceptor};
pub use populate::{NodePopulator, PopulateError};

use crate::convert::{ConversionError, ConverterRegistry};
use crate::model::{FieldValue, NodeId, RawNode, Record};
use crate::schema::TypeRegistry;
use crate::store::{ContentStore, StoreError};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Read-path mapping failures.
#[derive(Debug)]
pub enum MapError {
    /// Eager population aborted on one declared field.
    Populate(PopulateError),
    /// Deferred conversion failed on first access.
    Conversion(ConversionError),
    /// Store-layer failure.
    Store(StoreError),
}

impl Display for MapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Populate(err) => write!(f, "{err}"),
            Self::Conversion(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Populate(err) => Some(err),
            Self::Conversion(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<PopulateError> for MapError {
    fn from(value: PopulateError) -> Self {
        Self::Populate(value)
    }
}

impl From<ConversionError> for MapError {
    fn from(value: ConversionError) -> Self {
        Self::Conversion(value)
    }
}

impl From<StoreError> for MapError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Facade wiring activator, populator and interceptor over one store.
///
/// Holds shared references only; cheap to copy into traversal iterators.
pub struct NodeMapper<'a, S: ContentStore> {
    store: &'a S,
    types: &'a TypeRegistry,
    converters: &'a ConverterRegistry,
}

impl<'a, S: ContentStore> NodeMapper<'a, S> {
    pub fn new(store: &'a S, types: &'a TypeRegistry, converters: &'a ConverterRegistry) -> Self {
        Self {
            store,
            types,
            converters,
        }
    }

    /// Maps one raw node into a typed record.
    ///
    /// Yields `Ok(None)` for absent or unresolvable nodes and for type tags
    /// with no registered descriptor; those are soft absences, not errors.
    pub fn map_node(&self, raw: Option<&RawNode>) -> Result<Option<Record>, MapError> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        let Some(descriptor) = self.types.get(&raw.type_tag) else {
            debug!(
                "event=map_node module=map status=skipped node_id={} type_tag={} reason=unregistered_type",
                raw.id, raw.type_tag
            );
            return Ok(None);
        };

        let mut record = InstanceActivator::activate(raw.clone());
        let populator = NodePopulator::new(self.store, self.converters);
        if !populator.populate(Some(raw), descriptor, &mut record)? {
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Loads and maps one node by id.
    pub fn map_by_id(&self, id: NodeId) -> Result<Option<Record>, MapError> {
        let raw = self.store.get_node(id)?;
        self.map_node(raw.as_ref())
    }

    /// Reads one declared field, computing deferred fields on first access.
    ///
    /// Eager fields come straight from the record; overridable fields go
    /// through the interceptor, which converts against the bound raw node,
    /// applies the type's accessor hook and caches the result. `Ok(None)`
    /// means the field is not declared for the record's type.
    pub fn field(&self, record: &Record, name: &str) -> Result<Option<FieldValue>, MapError> {
        let Some(descriptor) = self.types.get(&record.system.type_tag) else {
            return Ok(None);
        };
        let Some(field) = descriptor.field(name) else {
            return Ok(None);
        };

        if !field.overridable {
            return Ok(record.get(name));
        }

        let interceptor = LazyFieldInterceptor::new(self.store, self.converters);
        let value = interceptor.intercept(record, descriptor, field)?;
        Ok(Some(value))
    }
}

impl<S: ContentStore> Clone for NodeMapper<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ContentStore> Copy for NodeMapper<'_, S> {}
