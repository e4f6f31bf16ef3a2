#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use databnf_sparql::sparql::{BindingRow, RawBinding, RawResult, TransportError};
use parking_lot::Mutex;
use tempfile::{TempDir, tempdir};

/// Fake endpoint that records every query it receives.
///
/// Clones share the same log, so one handle can be given to a database while
/// the test keeps another.
#[derive(Clone)]
pub struct RecordingTransport {
    queries: Arc<Mutex<Vec<String>>>,
    respond: Arc<dyn Fn(&str) -> Result<RawResult, TransportError> + Send + Sync>,
}

impl RecordingTransport {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&str) -> Result<RawResult, TransportError> + Send + Sync + 'static,
    {
        Self {
            queries: Arc::new(Mutex::new(Vec::new())),
            respond: Arc::new(respond),
        }
    }

    /// Always answers with `result`
    pub fn returning(result: RawResult) -> Self {
        Self::new(move |_| Ok(result.clone()))
    }

    /// Always fails as an unreachable endpoint would
    pub fn failing() -> Self {
        Self::new(|_| Err(TransportError::Other("connection refused".into())))
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().len()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

impl databnf_sparql::sparql::Transport for RecordingTransport {
    fn execute(&self, query: &str) -> Result<RawResult, TransportError> {
        self.queries.lock().push(query.to_string());
        (self.respond)(query)
    }
}

/// Build a result document from `(variable, binding)` rows
pub fn result(vars: &[&str], rows: Vec<Vec<(&str, RawBinding)>>) -> RawResult {
    let bindings = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(var, binding)| (var.to_string(), binding))
                .collect::<BindingRow>()
        })
        .collect();
    RawResult::new(vars.iter().map(|v| v.to_string()).collect(), bindings)
}

/// `(subject, prop, value)` rows as returned by the authority queries
pub fn property_rows(subject: &str, props: &[(&str, RawBinding)]) -> RawResult {
    result(
        &["s", "prop", "value"],
        props
            .iter()
            .map(|(prop, value)| {
                vec![
                    ("s", RawBinding::uri(subject)),
                    ("prop", RawBinding::uri(*prop)),
                    ("value", value.clone()),
                ]
            })
            .collect(),
    )
}

pub struct TestWorkspace {
    _tempdir: TempDir,
    root: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let tempdir = tempdir().expect("tempdir");
        let root = tempdir.path().to_path_buf();
        Self {
            _tempdir: tempdir,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Number of `*.json` entries directly under `dir`
    pub fn json_files(&self, dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                    .count()
            })
            .unwrap_or(0)
    }
}
