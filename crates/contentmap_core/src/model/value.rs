//! Typed field value produced by conversion.

use serde::{Deserialize, Serialize};

/// One converted field value.
///
/// `Null` stands for "alias absent on the node" and for nullable primitives
/// with an empty raw value. `Markup` carries store markup unescaped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Epoch ms timestamp.
    Date(i64),
    /// Markup fragment kept verbatim, never escaped.
    Markup(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) | Self::Markup(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) | Self::Date(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Short label used in diagnostics.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Date(_) => "date",
            Self::Markup(_) => "markup",
        }
    }

    /// Store-side string form used when no write converter applies.
    pub fn to_raw(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(value) | Self::Markup(value) => value.clone(),
            Self::Bool(true) => "1".to_string(),
            Self::Bool(false) => "0".to_string(),
            Self::Int(value) | Self::Date(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
        }
    }
}
