//! Value conversion between raw store strings and typed field values.

pub mod field_mapper;
pub mod registry;

pub use field_mapper::{FieldMapper, MarkupSource, NoMarkup};
pub use registry::{ConverterRegistry, ConverterRegistryError};

use crate::model::FieldValue;
use crate::schema::FieldKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Read/write conversion pair for one field value.
///
/// `read` turns a raw store string into a typed value; `write` turns a typed
/// value back into the store-side string form. Both sides report failures as
/// plain messages; the mapper wraps them with full field context.
pub trait Converter {
    fn read(&self, raw: &str) -> Result<FieldValue, String>;
    fn write(&self, value: &FieldValue) -> Result<String, String>;
}

/// Raw-to-typed (or typed-to-raw) coercion failure with full field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    /// In-memory field name.
    pub field: String,
    /// Store alias the raw value came from.
    pub alias: String,
    /// Raw value that failed to convert.
    pub raw: String,
    /// Declared target kind.
    pub kind: FieldKind,
    /// Underlying cause.
    pub cause: String,
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot convert field `{}` (alias `{}`, kind {}) from raw value `{}`: {}",
            self.field,
            self.alias,
            self.kind.label(),
            self.raw,
            self.cause
        )
    }
}

impl Error for ConversionError {}
