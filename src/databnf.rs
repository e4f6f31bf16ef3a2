//! data.bnf.fr authority records
//!
//! Fetches every property of an authority concept and of the agent it
//! describes (`foaf:focus`), folded into one map keyed by qualified name.
//!
//! ```no_run
//! use databnf_sparql::databnf::AuthorityFetcher;
//!
//! let fetcher = AuthorityFetcher::databnf(None)?;
//! let props = fetcher.fetch(11917290)?;
//! if let Some(depictions) = props.get("foaf:depiction") {
//!     println!("{} depictions", depictions.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::Error;
use crate::sparql::cache::{CacheError, QueryCache};
use crate::sparql::namespaces::NamespaceRegistry;
use crate::sparql::result_set::{ResultSet, Row};
use crate::sparql::transport::{HttpTransport, Transport};
use crate::sparql::value::Value;
use crate::sparql::SparqlDatabase;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;

pub const DATABNF_ENDPOINT: &str = "http://data.bnf.fr/sparql";

const CONCEPT_PROPS_TEMPLATE: &str = "
PREFIX bnf-onto: <http://data.bnf.fr/ontology/bnf-onto/>
PREFIX skos: <http://www.w3.org/2004/02/skos/core#>

SELECT ?concept ?prop ?value WHERE {
 ?concept bnf-onto:FRBNF {bnf_id};
    ?prop ?value.

}
    ";

const AGENT_PROPS_TEMPLATE: &str = "
PREFIX bnf-onto: <http://data.bnf.fr/ontology/bnf-onto/>
PREFIX foaf: <http://xmlns.com/foaf/0.1/>
PREFIX skos: <http://www.w3.org/2004/02/skos/core#>

SELECT ?agent ?prop ?value WHERE {
 ?concept bnf-onto:FRBNF {bnf_id};
    foaf:focus ?agent.
 ?agent ?prop ?value.
}
    ";

/// Properties of the concept record for `bnf_id`
pub fn concept_props_query(bnf_id: u64) -> String {
    CONCEPT_PROPS_TEMPLATE.replace("{bnf_id}", &bnf_id.to_string())
}

/// Properties of the agent linked to the concept `bnf_id` through `foaf:focus`
pub fn agent_props_query(bnf_id: u64) -> String {
    AGENT_PROPS_TEMPLATE.replace("{bnf_id}", &bnf_id.to_string())
}

// =============================================================================
// Property map
// =============================================================================

/// A property seen once holds a scalar; seen again it becomes a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Single(Value),
    Multiple(Vec<Value>),
}

impl PropertyValue {
    fn push(&mut self, value: Value) {
        match self {
            PropertyValue::Single(first) => {
                let first = std::mem::take(first);
                *self = PropertyValue::Multiple(vec![first, value]);
            }
            PropertyValue::Multiple(values) => values.push(value),
        }
    }

    /// Every value, in encounter order
    pub fn as_slice(&self) -> &[Value] {
        match self {
            PropertyValue::Single(value) => std::slice::from_ref(value),
            PropertyValue::Multiple(values) => values,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, PropertyValue::Multiple(_))
    }

    /// First value seen
    pub fn first(&self) -> Option<&Value> {
        self.as_slice().first()
    }
}

/// Qualified property name → value(s), in first-seen order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct AuthorityProperties {
    props: IndexMap<String, PropertyValue>,
}

impl AuthorityProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `prop`
    pub fn insert(&mut self, prop: String, value: Value) {
        match self.props.get_mut(&prop) {
            Some(existing) => existing.push(value),
            None => {
                self.props.insert(prop, PropertyValue::Single(value));
            }
        }
    }

    pub fn get(&self, prop: &str) -> Option<&PropertyValue> {
        self.props.get(prop)
    }

    /// All values of `prop`; empty when absent
    pub fn values(&self, prop: &str) -> &[Value] {
        self.props
            .get(prop)
            .map(PropertyValue::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, prop: &str) -> bool {
        self.props.contains_key(prop)
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.props.iter().map(|(prop, value)| (prop.as_str(), value))
    }

    /// Fold `(subject, property, value)` rows into the map, qualifying
    /// property URIs with `namespaces`. The subject column is ignored and
    /// rows without a property are skipped.
    pub fn extend_from_rows<I>(&mut self, rows: I, namespaces: &NamespaceRegistry)
    where
        I: IntoIterator<Item = Row>,
    {
        for row in rows {
            let mut cells = row.into_values().into_iter().skip(1);
            let (Some(prop), value) = (cells.next(), cells.next()) else {
                continue;
            };
            let prop = match prop {
                Value::Null => {
                    tracing::debug!("skipping row without property");
                    continue;
                }
                Value::Integer(n) => n.to_string(),
                Value::Text(lit) => namespaces.qualify(&lit),
            };
            self.insert(prop, value.unwrap_or_default());
        }
    }
}

impl<'a> IntoIterator for &'a AuthorityProperties {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = indexmap::map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.props.iter()
    }
}

// =============================================================================
// Fetcher
// =============================================================================

/// Runs the concept and agent queries for an authority and merges them
#[derive(Debug)]
pub struct AuthorityFetcher<T = HttpTransport> {
    db: SparqlDatabase<T>,
}

impl AuthorityFetcher<HttpTransport> {
    /// Fetcher against the public data.bnf.fr endpoint
    pub fn databnf(cache_dir: Option<PathBuf>) -> Result<Self, Error> {
        let db = SparqlDatabase::connect(DATABNF_ENDPOINT, cache_dir)?
            .with_autoprefix(NamespaceRegistry::databnf().clone());
        Ok(Self { db })
    }
}

impl<T: Transport> AuthorityFetcher<T> {
    /// Wrap a database; its autoprefix table (data.bnf.fr if none) is also
    /// used to qualify property names.
    pub fn new(db: SparqlDatabase<T>) -> Self {
        let db = if db.namespaces().is_some() {
            db
        } else {
            db.with_autoprefix(NamespaceRegistry::databnf().clone())
        };
        Self { db }
    }

    /// Fetcher over an arbitrary transport with the data.bnf.fr namespaces
    pub fn with_transport(transport: T, cache: QueryCache) -> Self {
        Self::new(SparqlDatabase::new(transport, cache).with_endpoint_label(DATABNF_ENDPOINT))
    }

    pub fn database(&self) -> &SparqlDatabase<T> {
        &self.db
    }

    fn namespaces(&self) -> &NamespaceRegistry {
        match self.db.namespaces() {
            Some(namespaces) => namespaces,
            None => NamespaceRegistry::databnf(),
        }
    }

    /// Properties of authority `bnf_id`.
    ///
    /// A failing query contributes no properties; only cache errors are
    /// returned.
    pub fn fetch(&self, bnf_id: u64) -> Result<AuthorityProperties, CacheError> {
        let concept = self.db.execute(&concept_props_query(bnf_id))?;
        let agent = self.db.execute(&agent_props_query(bnf_id))?;
        Ok(self.fold(bnf_id, &concept, &agent))
    }

    /// Like [`Self::fetch`], but a failing query is an error
    pub fn try_fetch(&self, bnf_id: u64) -> Result<AuthorityProperties, Error> {
        let concept = self.db.try_execute(&concept_props_query(bnf_id))?;
        let agent = self.db.try_execute(&agent_props_query(bnf_id))?;
        Ok(self.fold(bnf_id, &concept, &agent))
    }

    fn fold(&self, bnf_id: u64, concept: &ResultSet, agent: &ResultSet) -> AuthorityProperties {
        let mut props = AuthorityProperties::new();
        props.extend_from_rows(concept.iter().chain(agent.iter()), self.namespaces());
        tracing::debug!(
            bnf_id,
            concept_rows = concept.len(),
            agent_rows = agent.len(),
            properties = props.len(),
            "authority fetched"
        );
        props
    }
}
