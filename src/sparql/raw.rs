// =============================================================================
// Raw SPARQL JSON Results
// =============================================================================
// Serde model of the SPARQL 1.1 JSON results document, kept byte-faithful
// enough to be written back to the cache unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Datatype URI of `xsd:integer`
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

/// RDF term kind of a binding (`type` key)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TermType {
    Uri,
    Literal,
    /// Legacy SPARQL 1.0 / Virtuoso form of a datatyped literal
    TypedLiteral,
    Bnode,
    /// Anything else the endpoint sends, kept verbatim
    Other(String),
}

impl TermType {
    pub fn as_str(&self) -> &str {
        match self {
            TermType::Uri => "uri",
            TermType::Literal => "literal",
            TermType::TypedLiteral => "typed-literal",
            TermType::Bnode => "bnode",
            TermType::Other(other) => other,
        }
    }
}

impl From<String> for TermType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "uri" => TermType::Uri,
            "literal" => TermType::Literal,
            "typed-literal" => TermType::TypedLiteral,
            "bnode" => TermType::Bnode,
            _ => TermType::Other(value),
        }
    }
}

impl From<TermType> for String {
    fn from(value: TermType) -> Self {
        match value {
            TermType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TermType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One variable's value within one solution.
///
/// Keys other than `type`, `value`, `datatype` and `xml:lang` are kept in
/// `extra`, including the non-standard `lang` some endpoints send, so an entry
/// is written back with the keys it arrived with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBinding {
    #[serde(rename = "type")]
    pub term_type: TermType,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl RawBinding {
    fn new(term_type: TermType, value: impl Into<String>) -> Self {
        Self {
            term_type,
            value: value.into(),
            datatype: None,
            lang: None,
            extra: Map::new(),
        }
    }

    pub fn uri(value: impl Into<String>) -> Self {
        Self::new(TermType::Uri, value)
    }

    pub fn literal(value: impl Into<String>, lang: Option<&str>) -> Self {
        Self {
            lang: lang.map(str::to_string),
            ..Self::new(TermType::Literal, value)
        }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            datatype: Some(datatype.into()),
            ..Self::new(TermType::TypedLiteral, value)
        }
    }

    pub fn bnode(value: impl Into<String>) -> Self {
        Self::new(TermType::Bnode, value)
    }

    /// Language tag from `xml:lang`, falling back to a bare `lang` key
    pub fn language(&self) -> Option<&str> {
        self.lang
            .as_deref()
            .or_else(|| self.extra.get("lang").and_then(JsonValue::as_str))
    }
}

/// One solution: variable name → binding. Unbound variables are simply absent.
pub type BindingRow = IndexMap<String, RawBinding>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    #[serde(default)]
    pub bindings: Vec<BindingRow>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Result document as returned by an endpoint or loaded from the cache.
///
/// Keys this model does not name (`link`, `distinct`, `boolean`, ...) are kept
/// in `extra` maps so a round-trip through the cache loses nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub head: Head,
    #[serde(default)]
    pub results: Results,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl RawResult {
    /// Well-formed result with no variables and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(variables: Vec<String>, bindings: Vec<BindingRow>) -> Self {
        Self {
            head: Head {
                vars: variables,
                extra: Map::new(),
            },
            results: Results {
                bindings,
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    /// Declared variables, in projection order
    pub fn variables(&self) -> &[String] {
        &self.head.vars
    }

    pub fn bindings(&self) -> &[BindingRow] {
        &self.results.bindings
    }

    /// Number of solutions
    pub fn len(&self) -> usize {
        self.results.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.bindings.is_empty()
    }
}
