//! Per-field raw-to-typed conversion.
//!
//! # Responsibility
//! - Turn one raw field value into one typed value following a fixed
//!   resolution order: absence, boolean coercion, per-field converter,
//!   kind converter, markup fallback, nullable wrapper, markup kind,
//!   generic parsing.
//!
//! # Invariants
//! - A per-field named converter runs unconditionally, empty raw values
//!   included; type-level converters only ever see non-empty values, with
//!   empty values falling through to the markup fallback.
//! - Boolean coercion wins over any converter.
//! - Failures carry field, alias, raw value, kind and cause.

use super::registry::ConverterRegistry;
use super::{ConversionError, Converter};
use crate::model::{FieldValue, NodeId, RawNode};
use crate::schema::{FieldDescriptor, FieldKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static ELEMENT_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[A-Za-z!/][^>]*>").expect("valid element tag regex"));

/// Best-effort markup fragment lookup for the empty-value fallback.
///
/// Implementations return `None` for missing fragments and for lookup
/// failures; the fallback never aborts a mapping pass.
pub trait MarkupSource {
    fn markup_fragment(&self, node_id: NodeId, alias: &str) -> Option<String>;
}

/// Markup source that never yields a fragment.
pub struct NoMarkup;

impl MarkupSource for NoMarkup {
    fn markup_fragment(&self, _node_id: NodeId, _alias: &str) -> Option<String> {
        None
    }
}

/// Converts one raw field value into one typed value.
pub struct FieldMapper<'a> {
    converters: &'a ConverterRegistry,
}

impl<'a> FieldMapper<'a> {
    pub fn new(converters: &'a ConverterRegistry) -> Self {
        Self { converters }
    }

    /// Reads one declared field off a raw node.
    ///
    /// `markup` supplies the store's markup fragment for the empty-value
    /// fallback; pass [`NoMarkup`] when no snapshot is available.
    pub fn read_field(
        &self,
        node: &RawNode,
        descriptor: &FieldDescriptor,
        markup: &dyn MarkupSource,
    ) -> Result<FieldValue, ConversionError> {
        let Some(raw) = node.field(&descriptor.alias) else {
            return Ok(FieldValue::Null);
        };

        if descriptor.kind == FieldKind::Boolean {
            return Ok(FieldValue::Bool(!(raw.is_empty() || raw == "0")));
        }

        // A named converter owns the field outright, empty values included.
        if let Some(name) = &descriptor.converter {
            let converter = self.converters.named(name).ok_or_else(|| {
                conversion_error(descriptor, raw, format!("converter `{name}` not registered"))
            })?;
            return converter
                .read(raw)
                .map_err(|cause| conversion_error(descriptor, raw, cause));
        }

        let kind_converter = self.converters.for_kind(descriptor.kind);

        if !raw.is_empty() {
            if let Some(converter) = &kind_converter {
                return converter
                    .read(raw)
                    .map_err(|cause| conversion_error(descriptor, raw, cause));
            }
        } else if descriptor.kind == FieldKind::Text || kind_converter.is_some() {
            if let Some(value) =
                self.markup_fallback(node, descriptor, markup, kind_converter.as_ref())?
            {
                return Ok(value);
            }
            if descriptor.kind == FieldKind::Text {
                return Ok(FieldValue::Text(String::new()));
            }
        }

        if descriptor.nullable {
            if raw.is_empty() {
                return Ok(FieldValue::Null);
            }
            return parse_primitive(descriptor, raw);
        }

        if descriptor.kind == FieldKind::Markup {
            return Ok(FieldValue::Markup(raw.to_string()));
        }

        parse_primitive(descriptor, raw)
    }

    fn markup_fallback(
        &self,
        node: &RawNode,
        descriptor: &FieldDescriptor,
        markup: &dyn MarkupSource,
        kind_converter: Option<&Arc<dyn Converter>>,
    ) -> Result<Option<FieldValue>, ConversionError> {
        let Some(fragment) = markup.markup_fragment(node.id, &descriptor.alias) else {
            return Ok(None);
        };

        if let Some(converter) = kind_converter {
            let value = converter
                .read(&fragment)
                .map_err(|cause| conversion_error(descriptor, &fragment, cause))?;
            return Ok(Some(value));
        }

        // Element-bearing fragments stay markup; text-only content comes
        // back as plain text.
        if ELEMENT_TAG_RE.is_match(&fragment) {
            return Ok(Some(FieldValue::Markup(fragment)));
        }
        Ok(Some(FieldValue::Text(fragment)))
    }
}

fn parse_primitive(
    descriptor: &FieldDescriptor,
    raw: &str,
) -> Result<FieldValue, ConversionError> {
    match descriptor.kind {
        FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
        FieldKind::Markup => Ok(FieldValue::Markup(raw.to_string())),
        FieldKind::Boolean => Ok(FieldValue::Bool(!(raw.is_empty() || raw == "0"))),
        FieldKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(FieldValue::Int)
            .map_err(|err| conversion_error(descriptor, raw, err.to_string())),
        FieldKind::Decimal => raw
            .trim()
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|err| conversion_error(descriptor, raw, err.to_string())),
        FieldKind::Date => raw
            .trim()
            .parse::<i64>()
            .map(FieldValue::Date)
            .map_err(|err| conversion_error(descriptor, raw, err.to_string())),
    }
}

fn conversion_error(
    descriptor: &FieldDescriptor,
    raw: &str,
    cause: impl Into<String>,
) -> ConversionError {
    ConversionError {
        field: descriptor.name.clone(),
        alias: descriptor.alias.clone(),
        raw: raw.to_string(),
        kind: descriptor.kind,
        cause: cause.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldMapper, NoMarkup};
    use crate::convert::registry::ConverterRegistry;
    use crate::convert::Converter;
    use crate::model::{FieldValue, RawNode, UserId};
    use crate::schema::{FieldDescriptor, FieldKind};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct DefaultingRank;

    impl Converter for DefaultingRank {
        fn read(&self, raw: &str) -> Result<FieldValue, String> {
            if raw.is_empty() {
                return Ok(FieldValue::Int(-1));
            }
            raw.parse::<i64>()
                .map(FieldValue::Int)
                .map_err(|err| err.to_string())
        }

        fn write(&self, value: &FieldValue) -> Result<String, String> {
            Ok(value.to_raw())
        }
    }

    fn node_with_field(alias: &str, value: &str) -> RawNode {
        let mut fields = BTreeMap::new();
        fields.insert(alias.to_string(), value.to_string());
        RawNode {
            id: 42,
            type_tag: "Page".to_string(),
            parent_id: 10,
            path: ",1,10,42,".to_string(),
            name: "page".to_string(),
            template: String::new(),
            url: String::new(),
            sort_order: 0,
            created_at: 0,
            updated_at: 0,
            creator: UserId::nil(),
            writer: UserId::nil(),
            version: 1,
            fields,
        }
    }

    #[test]
    fn boolean_coercion_treats_empty_and_zero_as_false() {
        let registry = ConverterRegistry::new();
        let mapper = FieldMapper::new(&registry);
        let descriptor = FieldDescriptor::new("visible", "visible", FieldKind::Boolean);

        for (raw, expected) in [("", false), ("0", false), ("1", true), ("yes", true)] {
            let node = node_with_field("visible", raw);
            let value = mapper.read_field(&node, &descriptor, &NoMarkup).unwrap();
            assert_eq!(value, FieldValue::Bool(expected), "raw `{raw}`");
        }
    }

    #[test]
    fn named_converter_also_handles_empty_raw_values() {
        let mut registry = ConverterRegistry::new();
        registry
            .register_named("defaulting_rank", Arc::new(DefaultingRank))
            .unwrap();
        let mapper = FieldMapper::new(&registry);
        let descriptor = FieldDescriptor::new("rank", "rank", FieldKind::Integer)
            .with_converter("defaulting_rank");

        let node = node_with_field("rank", "");
        assert_eq!(
            mapper.read_field(&node, &descriptor, &NoMarkup).unwrap(),
            FieldValue::Int(-1)
        );

        let node = node_with_field("rank", "7");
        assert_eq!(
            mapper.read_field(&node, &descriptor, &NoMarkup).unwrap(),
            FieldValue::Int(7)
        );
    }

    #[test]
    fn absent_alias_maps_to_null() {
        let registry = ConverterRegistry::new();
        let mapper = FieldMapper::new(&registry);
        let descriptor = FieldDescriptor::new("title", "title", FieldKind::Text);
        let node = node_with_field("other", "x");
        let value = mapper.read_field(&node, &descriptor, &NoMarkup).unwrap();
        assert_eq!(value, FieldValue::Null);
    }

    #[test]
    fn nullable_integer_maps_empty_to_null_and_parses_otherwise() {
        let registry = ConverterRegistry::new();
        let mapper = FieldMapper::new(&registry);
        let descriptor = FieldDescriptor::new("rank", "rank", FieldKind::Integer).nullable();

        let node = node_with_field("rank", "");
        assert_eq!(
            mapper.read_field(&node, &descriptor, &NoMarkup).unwrap(),
            FieldValue::Null
        );

        let node = node_with_field("rank", "7");
        assert_eq!(
            mapper.read_field(&node, &descriptor, &NoMarkup).unwrap(),
            FieldValue::Int(7)
        );
    }

    #[test]
    fn parse_failure_carries_field_alias_raw_and_kind() {
        let registry = ConverterRegistry::new();
        let mapper = FieldMapper::new(&registry);
        let descriptor = FieldDescriptor::new("rank", "rankAlias", FieldKind::Integer);
        let node = node_with_field("rankAlias", "seven");

        let err = mapper
            .read_field(&node, &descriptor, &NoMarkup)
            .unwrap_err();
        assert_eq!(err.field, "rank");
        assert_eq!(err.alias, "rankAlias");
        assert_eq!(err.raw, "seven");
        assert_eq!(err.kind, FieldKind::Integer);
    }
}
