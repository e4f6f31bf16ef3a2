// =============================================================================
// Namespace Registry
// =============================================================================
// Prefix → namespace URI table used to auto-declare PREFIX clauses and to
// compress URIs into qualified names.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Candidate `prefix:local` tokens surrounded by whitespace.
///
/// Matches are non-overlapping: the trailing whitespace of one token is
/// consumed, so a token directly following it is not seen.
static PREFIXED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(\w+):\w+\s+").expect("prefixed name pattern is valid"));

/// Namespaces published by data.bnf.fr, in declaration order.
const DATABNF_NAMESPACES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("xfoaf", "http://www.foafrealm.org/xfoaf/0.1/"),
    ("dcmitype", "http://purl.org/dc/dcmitype/"),
    ("ore", "http://www.openarchives.org/ore/terms/"),
    ("ark", "http://ark.bnf.fr/ark:/12148/"),
    ("dbpedia", "http://dbpedia.org/"),
    ("dbpediaowl", "http://dbpedia.org/ontology/"),
    ("dbprop", "http://dbpedia.org/property/"),
    ("rdagroup2elements", "http://rdvocab.info/ElementsGr2/"),
    ("frbr", "http://rdvocab.info/uri/schema/FRBRentitiesRDA/"),
    ("rdarole", "http://rdvocab.info/roles/"),
    ("rdagroup1elements", "http://rdvocab.info/Elements/"),
    ("rdarelationships", "http://rdvocab.info/RDARelationshipsWEMI/"),
    ("og", "http://ogp.me/ns#"),
    ("bnf-onto", "http://data.bnf.fr/ontology/bnf-onto/"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("time", "http://www.w3.org/TR/owl-time/"),
    ("marcrel", "http://id.loc.gov/vocabulary/relators/"),
    ("bnfroles", "http://data.bnf.fr/vocabulary/roles/"),
    ("mo", "http://musicontology.com/"),
    ("geo", "http://www.w3.org/2003/01/geo/wgs84_pos#"),
    ("ign", "http://data.ign.fr/ontology/topo.owl/"),
    ("insee", "http://rdf.insee.fr/geo/"),
    ("gn", "http://www.geonames.org/ontology/ontology_v3.1.rdf/"),
    ("dcdoc", "http://dublincore.org/documents/"),
    ("bio", "http://vocab.org/bio/0.1/"),
    ("isni", "http://isni.org/ontology#"),
    ("bibo", "http://purl.org/ontology/bibo/"),
    ("schema", "http://schema.org/"),
];

static DATABNF: Lazy<NamespaceRegistry> = Lazy::new(|| {
    NamespaceRegistry::from_pairs(DATABNF_NAMESPACES.iter().copied())
        .expect("built-in data.bnf.fr namespace table has no conflicting prefixes")
});

/// Errors raised while building a namespace table
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    #[error("prefix '{prefix}' is declared twice with different URIs: <{existing}> and <{conflicting}>")]
    ConflictingPrefix {
        prefix: String,
        existing: String,
        conflicting: String,
    },

    #[error("namespace <{0}> has an empty prefix")]
    EmptyPrefix(String),
}

/// Immutable prefix → URI table.
///
/// Shape-checked at construction: a prefix can only map to one URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceRegistry {
    prefixes: IndexMap<String, String>,
    /// (uri, prefix) sorted by descending URI length, first declaration first on ties
    by_uri: Vec<(String, String)>,
}

impl NamespaceRegistry {
    /// Build a registry from `(prefix, uri)` pairs.
    ///
    /// # Errors
    /// Returns `Err` if a prefix is empty or declared twice with different URIs.
    pub fn from_pairs<I, P, U>(pairs: I) -> Result<Self, NamespaceError>
    where
        I: IntoIterator<Item = (P, U)>,
        P: Into<String>,
        U: Into<String>,
    {
        let mut prefixes: IndexMap<String, String> = IndexMap::new();
        for (prefix, uri) in pairs {
            insert_checked(&mut prefixes, prefix.into(), uri.into())?;
        }
        Ok(Self::from_table(prefixes))
    }

    /// Shared data.bnf.fr table
    pub fn databnf() -> &'static NamespaceRegistry {
        &DATABNF
    }

    fn from_table(prefixes: IndexMap<String, String>) -> Self {
        let mut by_uri: Vec<(String, String)> = Vec::with_capacity(prefixes.len());
        for (prefix, uri) in &prefixes {
            if by_uri.iter().any(|(known, _)| known == uri) {
                continue;
            }
            by_uri.push((uri.clone(), prefix.clone()));
        }
        // stable: equal lengths keep declaration order
        by_uri.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { prefixes, by_uri }
    }

    /// Combine two registries; `other` adds prefixes on top of `self`.
    ///
    /// # Errors
    /// Returns `Err` if `other` redefines one of `self`'s prefixes with a different URI.
    pub fn merge(&self, other: &NamespaceRegistry) -> Result<Self, NamespaceError> {
        let mut prefixes = self.prefixes.clone();
        for (prefix, uri) in &other.prefixes {
            insert_checked(&mut prefixes, prefix.clone(), uri.clone())?;
        }
        Ok(Self::from_table(prefixes))
    }

    /// Namespace URI declared for `prefix`
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.prefixes.contains_key(prefix)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// `(prefix, uri)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }

    /// Prepend `PREFIX` declarations for every known prefix used in `query`.
    ///
    /// Prefixes are declared in order of first appearance, followed by a blank
    /// line and the untouched query. Declarations already written by the caller
    /// are not detected, so a prefix used in the body may end up declared twice.
    pub fn inject_prefixes(&self, query: &str) -> String {
        let mut declared: Vec<&str> = Vec::new();
        for caps in PREFIXED_NAME.captures_iter(query) {
            let Some(prefix) = caps.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if self.contains(prefix) && !declared.contains(&prefix) {
                declared.push(prefix);
            }
        }

        if declared.is_empty() {
            return query.to_string();
        }

        let declarations = declared
            .iter()
            .filter_map(|prefix| {
                self.get(prefix)
                    .map(|uri| format!("PREFIX {prefix}: <{uri}>"))
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("{declarations}\n\n{query}")
    }

    /// Compress `uri` into `prefix:local` using the longest matching namespace.
    ///
    /// Returns the URI unchanged when no namespace matches.
    pub fn qualify(&self, uri: &str) -> String {
        self.by_uri
            .iter()
            .find_map(|(ns, prefix)| {
                uri.strip_prefix(ns.as_str())
                    .map(|local| format!("{prefix}:{local}"))
            })
            .unwrap_or_else(|| uri.to_string())
    }

    /// Expand a `prefix:local` name into a full URI
    pub fn expand(&self, qname: &str) -> Option<String> {
        let (prefix, local) = qname.split_once(':')?;
        self.get(prefix).map(|ns| format!("{ns}{local}"))
    }
}

fn insert_checked(
    prefixes: &mut IndexMap<String, String>,
    prefix: String,
    uri: String,
) -> Result<(), NamespaceError> {
    if prefix.is_empty() {
        return Err(NamespaceError::EmptyPrefix(uri));
    }
    match prefixes.get(&prefix) {
        Some(existing) if *existing == uri => {
            tracing::warn!(prefix = %prefix, uri = %uri, "namespace declared twice");
            Ok(())
        }
        Some(existing) => Err(NamespaceError::ConflictingPrefix {
            prefix,
            existing: existing.clone(),
            conflicting: uri,
        }),
        None => {
            prefixes.insert(prefix, uri);
            Ok(())
        }
    }
}
