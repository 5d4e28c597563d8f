//! Converter registry keyed by field kind or by explicit name.
//!
//! # Responsibility
//! - Hold type-level converters (one per field kind) and named converters
//!   referenced per field by descriptors.
//!
//! # Invariants
//! - Populated during start-up, read-only afterward; callers serialize
//!   registration themselves.

use super::Converter;
use crate::schema::FieldKind;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Converter registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConverterRegistryError {
    /// Converter name is blank after trim.
    InvalidName(String),
    /// A named converter is already registered under this name.
    DuplicateName(String),
    /// A type-level converter is already registered for this kind.
    DuplicateKind(FieldKind),
}

impl Display for ConverterRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(value) => write!(f, "converter name is invalid: `{value}`"),
            Self::DuplicateName(value) => {
                write!(f, "converter already registered: `{value}`")
            }
            Self::DuplicateKind(kind) => {
                write!(f, "kind converter already registered: {}", kind.label())
            }
        }
    }
}

impl Error for ConverterRegistryError {}

/// Start-up-populated converter registry.
///
/// Passed by reference into the mapper and the writer; never accessed as
/// ambient process-wide state.
#[derive(Default)]
pub struct ConverterRegistry {
    by_kind: BTreeMap<FieldKind, Arc<dyn Converter>>,
    named: BTreeMap<String, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the type-level converter for one field kind.
    pub fn register_kind(
        &mut self,
        kind: FieldKind,
        converter: Arc<dyn Converter>,
    ) -> Result<(), ConverterRegistryError> {
        if self.by_kind.contains_key(&kind) {
            return Err(ConverterRegistryError::DuplicateKind(kind));
        }
        self.by_kind.insert(kind, converter);
        Ok(())
    }

    /// Registers a converter referenced per field by name.
    pub fn register_named(
        &mut self,
        name: impl Into<String>,
        converter: Arc<dyn Converter>,
    ) -> Result<(), ConverterRegistryError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ConverterRegistryError::InvalidName(name));
        }
        if self.named.contains_key(trimmed) {
            return Err(ConverterRegistryError::DuplicateName(trimmed.to_string()));
        }
        self.named.insert(trimmed.to_string(), converter);
        Ok(())
    }

    /// Looks up the type-level converter for one kind.
    pub fn for_kind(&self, kind: FieldKind) -> Option<Arc<dyn Converter>> {
        self.by_kind.get(&kind).cloned()
    }

    /// Looks up one named converter.
    pub fn named(&self, name: &str) -> Option<Arc<dyn Converter>> {
        self.named.get(name.trim()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{Converter, ConverterRegistry, ConverterRegistryError};
    use crate::model::FieldValue;
    use crate::schema::FieldKind;
    use std::sync::Arc;

    struct UpperCase;

    impl Converter for UpperCase {
        fn read(&self, raw: &str) -> Result<FieldValue, String> {
            Ok(FieldValue::Text(raw.to_uppercase()))
        }

        fn write(&self, value: &FieldValue) -> Result<String, String> {
            Ok(value.to_raw().to_lowercase())
        }
    }

    #[test]
    fn named_registration_rejects_blank_and_duplicate_names() {
        let mut registry = ConverterRegistry::new();
        let err = registry.register_named("  ", Arc::new(UpperCase)).unwrap_err();
        assert!(matches!(err, ConverterRegistryError::InvalidName(_)));

        registry.register_named("upper", Arc::new(UpperCase)).unwrap();
        let err = registry
            .register_named("upper", Arc::new(UpperCase))
            .unwrap_err();
        assert_eq!(err, ConverterRegistryError::DuplicateName("upper".to_string()));
        assert!(registry.named(" upper ").is_some());
    }

    #[test]
    fn kind_registration_is_exclusive_per_kind() {
        let mut registry = ConverterRegistry::new();
        registry
            .register_kind(FieldKind::Text, Arc::new(UpperCase))
            .unwrap();
        let err = registry
            .register_kind(FieldKind::Text, Arc::new(UpperCase))
            .unwrap_err();
        assert_eq!(err, ConverterRegistryError::DuplicateKind(FieldKind::Text));
    }
}
