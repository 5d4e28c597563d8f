//! Declared-type schema: field descriptors and the type registry.

pub mod descriptor;
pub mod registry;

pub use descriptor::{FieldDescriptor, FieldKind, FieldOverride, TypeDescriptor};
pub use registry::{SchemaError, TypeRegistry};
