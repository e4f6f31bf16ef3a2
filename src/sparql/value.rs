// =============================================================================
// Decoded Binding Values
// =============================================================================
// Cell values produced from raw bindings: plain text (optionally language
// tagged), integers, or an explicit null for unbound variables.

use super::raw::{RawBinding, TermType, XSD_INTEGER};
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

/// Text value carrying an optional language tag.
///
/// Compares and hashes by text only; the tag is metadata.
#[derive(Debug, Clone)]
pub struct Literal {
    value: String,
    lang: Option<String>,
}

impl Literal {
    pub fn new(value: impl Into<String>, lang: Option<String>) -> Self {
        Self {
            value: value.into(),
            lang,
        }
    }

    pub fn plain(value: impl Into<String>) -> Self {
        Self::new(value, None)
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl Deref for Literal {
    type Target = str;

    fn deref(&self) -> &str {
        &self.value
    }
}

impl AsRef<str> for Literal {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Literal) -> bool {
        self.value == other.value
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl PartialEq<str> for Literal {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for Literal {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

/// One decoded cell of a result row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Value {
    /// Variable not bound in this solution
    #[default]
    Null,
    Integer(i64),
    Text(Literal),
}

impl Value {
    /// Decode a raw binding.
    ///
    /// Only `typed-literal` with datatype `xsd:integer` is coerced; every other
    /// kind passes through as text. `literal` keeps its language tag.
    pub fn from_binding(binding: &RawBinding) -> Self {
        match binding.term_type {
            TermType::Literal => {
                Value::Text(Literal::new(
                    binding.value.clone(),
                    binding.language().map(str::to_string),
                ))
            }
            TermType::TypedLiteral if binding.datatype.as_deref() == Some(XSD_INTEGER) => {
                match binding.value.trim().parse::<i64>() {
                    Ok(n) => Value::Integer(n),
                    Err(error) => {
                        tracing::debug!(
                            value = %binding.value,
                            %error,
                            "integer literal out of range, keeping text"
                        );
                        Value::Text(Literal::plain(binding.value.clone()))
                    }
                }
            }
            _ => Value::Text(Literal::plain(binding.value.clone())),
        }
    }

    /// Decode an optional binding; `None` becomes [`Value::Null`]
    pub fn from_optional(binding: Option<&RawBinding>) -> Self {
        binding.map(Self::from_binding).unwrap_or(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(lit) => Some(lit.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Value::Text(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn lang(&self) -> Option<&str> {
        self.as_literal().and_then(Literal::lang)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Text(lit) => f.write_str(lit.as_str()),
        }
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(Literal::plain(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(Literal::plain(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<Literal> for Value {
    fn from(value: Literal) -> Self {
        Value::Text(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Text(lit) => lit.serialize(serializer),
        }
    }
}
