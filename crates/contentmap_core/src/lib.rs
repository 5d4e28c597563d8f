//! Typed mapping layer over a tree-structured content store.
//!
//! Raw store nodes (id, type tag, parent, path, raw string fields) are
//! mapped into typed records field by field, with type coercion, custom
//! converters and a markup fallback; overridable fields are computed
//! lazily on first access. Traversal and write-back compose on top of
//! the mapper.

pub mod convert;
pub mod db;
pub mod logging;
pub mod map;
pub mod model;
pub mod nav;
pub mod schema;
pub mod store;
pub mod write;

pub use convert::{
    ConversionError, Converter, ConverterRegistry, ConverterRegistryError, FieldMapper,
    MarkupSource, NoMarkup,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use map::{
    InstanceActivator, LazyFieldInterceptor, MapError, NodeMapper, NodePopulator, PopulateError,
};
pub use model::{
    FieldValue, NodeId, RawNode, Record, SystemFields, UserId, RECYCLE_BIN_NODE_ID,
};
pub use nav::{Children, QueryError, QuerySelector, TreeNavigator};
pub use schema::{
    FieldDescriptor, FieldKind, FieldOverride, SchemaError, TypeDescriptor, TypeRegistry,
};
pub use store::{ContentStore, SqliteContentStore, StoreError, StoreMarkup, StoreResult};
pub use write::{ContentWriter, ValidationError, WriteError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
