// =============================================================================
// Namespace Registry Tests
// =============================================================================
// Prefix injection and URI qualification against the data.bnf.fr table

use assert_matches::assert_matches;
use databnf_sparql::sparql::{NamespaceError, NamespaceRegistry};
use proptest::prelude::*;

#[test]
fn autoprefix_declares_used_prefixes_in_order() {
    let query = "SELECT ?pref WHERE {
    ?concept a skos:Concept;
             skos:prefLabel ?pref;
             foaf:focus ?obj.
    ?obj a foaf:Organization.
    }";
    let prepared = NamespaceRegistry::databnf().inject_prefixes(query);
    assert_eq!(
        prepared,
        format!(
            "PREFIX skos: <http://www.w3.org/2004/02/skos/core#>\n\
             PREFIX foaf: <http://xmlns.com/foaf/0.1/>\n\n{query}"
        )
    );
}

#[test]
fn autoprefix_leaves_query_without_known_prefixes_untouched() {
    let ns = NamespaceRegistry::databnf();
    let query = "SELECT * WHERE { ?s ?p ?o } LIMIT 10";
    assert_eq!(ns.inject_prefixes(query), query);

    let unknown = "SELECT ?x WHERE { ?x nope:thing ?y }";
    assert_eq!(ns.inject_prefixes(unknown), unknown);
}

#[test]
fn autoprefix_ignores_tokens_not_followed_by_whitespace() {
    // `skos:Concept;` ends with punctuation, so it is not a candidate
    let ns = NamespaceRegistry::databnf();
    let query = "SELECT ?c WHERE { ?c a skos:Concept; }";
    assert_eq!(ns.inject_prefixes(query), query);
}

#[test]
fn qualify_prefers_longest_namespace() {
    let ns = NamespaceRegistry::databnf();
    assert_eq!(
        ns.qualify("http://dbpedia.org/ontology/birthPlace"),
        "dbpediaowl:birthPlace"
    );
    assert_eq!(ns.qualify("http://dbpedia.org/resource/Paris"), "dbpedia:resource/Paris");
    assert_eq!(
        ns.qualify("http://www.w3.org/2004/02/skos/core#prefLabel"),
        "skos:prefLabel"
    );
    assert_eq!(ns.qualify("http://example.org/x"), "http://example.org/x");
}

#[test]
fn expand_inverts_qualify() {
    let ns = NamespaceRegistry::databnf();
    assert_eq!(
        ns.expand("foaf:depiction").as_deref(),
        Some("http://xmlns.com/foaf/0.1/depiction")
    );
    assert_eq!(ns.expand("nope:x"), None);
    assert_eq!(ns.expand("no-colon"), None);
}

#[test]
fn registry_rejects_conflicting_prefix() {
    let err = NamespaceRegistry::from_pairs([
        ("ex", "http://example.org/a/"),
        ("ex", "http://example.org/b/"),
    ])
    .unwrap_err();
    assert_matches!(err, NamespaceError::ConflictingPrefix { prefix, .. } if prefix == "ex");
}

#[test]
fn registry_accepts_identical_duplicate() {
    let ns = NamespaceRegistry::from_pairs([
        ("ex", "http://example.org/"),
        ("ex", "http://example.org/"),
    ])
    .expect("identical duplicate is accepted");
    assert_eq!(ns.len(), 1);
}

#[test]
fn registry_rejects_empty_prefix() {
    let err = NamespaceRegistry::from_pairs([("", "http://example.org/")]).unwrap_err();
    assert_matches!(err, NamespaceError::EmptyPrefix(_));
}

#[test]
fn merge_adds_new_prefixes_after_builtin_ones() {
    let extra = NamespaceRegistry::from_pairs([("ex", "http://example.org/")]).unwrap();
    let merged = NamespaceRegistry::databnf().merge(&extra).unwrap();
    assert_eq!(merged.len(), NamespaceRegistry::databnf().len() + 1);
    assert_eq!(merged.iter().last(), Some(("ex", "http://example.org/")));
    assert_eq!(merged.qualify("http://example.org/thing"), "ex:thing");
}

#[test]
fn merge_rejects_redefinition_of_builtin_prefix() {
    let extra = NamespaceRegistry::from_pairs([("foaf", "http://example.org/foaf/")]).unwrap();
    assert_matches!(
        NamespaceRegistry::databnf().merge(&extra),
        Err(NamespaceError::ConflictingPrefix { .. })
    );
}

proptest! {
    #[test]
    fn injection_always_ends_with_untouched_query(body in "[ a-z?{}.:\n]{0,80}") {
        let prepared = NamespaceRegistry::databnf().inject_prefixes(&body);
        prop_assert!(prepared.ends_with(&body));
        if prepared != body {
            prop_assert!(prepared.starts_with("PREFIX "));
            prop_assert!(prepared.contains("\n\n"));
        }
    }

    #[test]
    fn qualified_names_expand_back(local in "[A-Za-z][A-Za-z0-9_]{0,20}") {
        let ns = NamespaceRegistry::databnf();
        let uri = format!("http://xmlns.com/foaf/0.1/{local}");
        let qname = ns.qualify(&uri);
        prop_assert_eq!(ns.expand(&qname), Some(uri));
    }
}
