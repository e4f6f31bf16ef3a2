// =============================================================================
// Result Set and Rows
// =============================================================================
// Lazy, restartable iteration over the solutions of a raw result document.

use super::raw::{BindingRow, RawResult};
use super::value::Value;
use indexmap::IndexMap;
use serde::Serialize;
use std::ops::Index;

/// One decoded solution, positionally aligned with the declared variables.
///
/// Accessible by position (`row[0]`) and by variable name (`row["prop"]`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Row {
    cells: IndexMap<String, Value>,
}

impl Row {
    fn decode(variables: &[String], binding: &BindingRow) -> Self {
        let cells = variables
            .iter()
            .map(|var| (var.clone(), Value::from_optional(binding.get(var))))
            .collect();
        Self { cells }
    }

    /// Value of variable `name`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells.get(name)
    }

    /// Value at position `idx`
    pub fn get_index(&self, idx: usize) -> Option<&Value> {
        self.cells.get_index(idx).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.cells.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(var, value)| (var.as_str(), value))
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.cells.values().cloned().collect()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.cells.into_values().collect()
    }
}

impl Index<usize> for Row {
    type Output = Value;

    fn index(&self, idx: usize) -> &Value {
        &self.cells[idx]
    }
}

impl Index<&str> for Row {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        match self.cells.get(name) {
            Some(value) => value,
            None => panic!("no variable '{name}' in row"),
        }
    }
}

/// Typed view over a [`RawResult`].
///
/// Iterating never consumes the underlying document, so a result set can be
/// walked any number of times.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    raw: RawResult,
}

impl ResultSet {
    pub fn new(raw: RawResult) -> Self {
        Self { raw }
    }

    /// Number of solutions
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Declared variables; authoritative for row shape
    pub fn variables(&self) -> &[String] {
        self.raw.variables()
    }

    pub fn iter(&self) -> Rows<'_> {
        Rows {
            variables: self.raw.variables(),
            bindings: self.raw.bindings().iter(),
        }
    }

    /// Decode the row at `idx`
    pub fn row(&self, idx: usize) -> Option<Row> {
        self.raw
            .bindings()
            .get(idx)
            .map(|binding| Row::decode(self.raw.variables(), binding))
    }

    pub fn raw(&self) -> &RawResult {
        &self.raw
    }

    pub fn into_raw(self) -> RawResult {
        self.raw
    }
}

impl From<RawResult> for ResultSet {
    fn from(raw: RawResult) -> Self {
        Self::new(raw)
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = Row;
    type IntoIter = Rows<'a>;

    fn into_iter(self) -> Rows<'a> {
        self.iter()
    }
}

/// Lazy row iterator; each row is decoded on demand
#[derive(Debug, Clone)]
pub struct Rows<'a> {
    variables: &'a [String],
    bindings: std::slice::Iter<'a, BindingRow>,
}

impl Iterator for Rows<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.bindings
            .next()
            .map(|binding| Row::decode(self.variables, binding))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bindings.size_hint()
    }
}

impl ExactSizeIterator for Rows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparql::raw::{RawBinding, XSD_INTEGER};

    fn sample() -> RawResult {
        let mut first = BindingRow::new();
        first.insert("s".into(), RawBinding::uri("http://example.org/a"));
        first.insert("n".into(), RawBinding::typed_literal("3", XSD_INTEGER));
        let mut second = BindingRow::new();
        second.insert("s".into(), RawBinding::uri("http://example.org/b"));
        RawResult::new(vec!["s".into(), "n".into()], vec![first, second])
    }

    #[test]
    fn test_rows_are_positional_and_named() {
        let rset = ResultSet::new(sample());
        let rows: Vec<Row> = rset.iter().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "http://example.org/a");
        assert_eq!(rows[0]["n"], 3i64);
        assert!(rows[1]["n"].is_null());
    }

    #[test]
    fn test_iteration_is_restartable() {
        let rset = ResultSet::new(sample());
        let first: Vec<Row> = rset.iter().collect();
        let second: Vec<Row> = (&rset).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(rset.iter().len(), rset.len());
    }

    #[test]
    fn test_empty_result() {
        let rset = ResultSet::new(RawResult::empty());
        assert_eq!(rset.len(), 0);
        assert!(rset.variables().is_empty());
        assert_eq!(rset.iter().count(), 0);
    }
}
