// =============================================================================
// SPARQL Result Decoding Tests
// =============================================================================
// Decoding of endpoint JSON into typed rows

use databnf_sparql::sparql::{RawResult, ResultSet, Value};

const DOCUMENT: &str = r#"{
  "head": { "link": [], "vars": ["name", "birth", "works", "note"] },
  "results": {
    "distinct": false,
    "ordered": true,
    "bindings": [
      {
        "name": { "type": "literal", "xml:lang": "fr", "value": "Alfred de Musset" },
        "birth": { "type": "typed-literal", "datatype": "http://www.w3.org/2001/XMLSchema#integer", "value": "1810" },
        "works": { "type": "typed-literal", "datatype": "http://www.w3.org/2001/XMLSchema#integer", "value": "99999999999999999999" },
        "note": { "type": "uri", "value": "http://data.bnf.fr/ark:/12148/cb11917290z" }
      },
      {
        "name": { "type": "literal", "value": "George Sand" },
        "birth": { "type": "typed-literal", "datatype": "http://www.w3.org/2001/XMLSchema#date", "value": "1804-07-01" }
      }
    ]
  }
}"#;

fn results() -> ResultSet {
    let raw: RawResult = serde_json::from_str(DOCUMENT).expect("valid SPARQL JSON");
    ResultSet::new(raw)
}

#[test]
fn rows_follow_declared_variable_order() {
    let rset = results();
    assert_eq!(rset.len(), 2);
    assert_eq!(rset.variables(), ["name", "birth", "works", "note"]);
    for row in &rset {
        assert_eq!(row.variables().collect::<Vec<_>>(), ["name", "birth", "works", "note"]);
    }
}

#[test]
fn literals_keep_language_tag() {
    let row = results().row(0).unwrap();
    assert_eq!(row["name"], "Alfred de Musset");
    assert_eq!(row["name"].lang(), Some("fr"));
    assert_eq!(row[0], row["name"]);
}

#[test]
fn only_integer_typed_literals_are_coerced() {
    let rset = results();
    let first = rset.row(0).unwrap();
    let second = rset.row(1).unwrap();

    assert_eq!(first["birth"], Value::Integer(1810));
    assert_eq!(first["birth"].as_i64(), Some(1810));
    // out of i64 range stays textual
    assert_eq!(first["works"], "99999999999999999999");
    assert_eq!(second["birth"], "1804-07-01");
}

#[test]
fn uris_decode_to_text() {
    let row = results().row(0).unwrap();
    assert_eq!(row["note"], "http://data.bnf.fr/ark:/12148/cb11917290z");
    assert_eq!(row["note"].lang(), None);
}

#[test]
fn unbound_variables_are_null() {
    let row = results().row(1).unwrap();
    assert_eq!(row.len(), 4);
    assert!(row["works"].is_null());
    assert!(row["note"].is_null());
    assert_eq!(row.get_index(3), Some(&Value::Null));
    assert_eq!(row.get("missing"), None);
}

#[test]
fn unknown_keys_survive_reserialization() {
    let raw: RawResult = serde_json::from_str(DOCUMENT).unwrap();
    let json = serde_json::to_value(&raw).unwrap();
    assert_eq!(json["head"]["link"], serde_json::json!([]));
    assert_eq!(json["results"]["ordered"], serde_json::json!(true));
    let again: RawResult = serde_json::from_value(json).unwrap();
    assert_eq!(again, raw);
}

#[test]
fn rows_serialize_as_objects() {
    let row = results().row(1).unwrap();
    assert_eq!(
        serde_json::to_value(&row).unwrap(),
        serde_json::json!({
            "name": "George Sand",
            "birth": "1804-07-01",
            "works": null,
            "note": null
        })
    );
}

#[test]
fn iteration_is_repeatable() {
    let rset = results();
    let first: Vec<_> = rset.iter().collect();
    let second: Vec<_> = rset.iter().collect();
    assert_eq!(first, second);
    assert_eq!(rset.iter().len(), 2);
}

#[test]
fn empty_document_has_no_rows() {
    let raw: RawResult = serde_json::from_str(r#"{"head":{"vars":[]},"results":{"bindings":[]}}"#)
        .unwrap();
    let rset = ResultSet::new(raw);
    assert!(rset.is_empty());
    assert!(rset.iter().next().is_none());
}
