// =============================================================================
// SPARQL Database
// =============================================================================
// Query execution boundary: prefix injection → cache → transport → typed
// result set.

use super::cache::{CacheError, QueryCache};
use super::namespaces::NamespaceRegistry;
use super::raw::RawResult;
use super::result_set::ResultSet;
use super::transport::{HttpTransport, Transport, TransportError};
use crate::error::{ERROR_METRICS, Error, transport_code};
use crate::logging::query_span;
use std::path::PathBuf;

/// Client for one SPARQL endpoint.
///
/// Results can be read by position or by variable name:
///
/// ```no_run
/// use databnf_sparql::sparql::SparqlDatabase;
///
/// let db = SparqlDatabase::connect("http://data.bnf.fr/sparql", None)?;
/// let results = db.execute("SELECT * WHERE { ?s ?p ?o } LIMIT 10")?;
/// for row in &results {
///     println!("{} {} {}", row["s"], row["p"], row["o"]);
///     println!("{} {} {}", row[0], row[1], row[2]);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct SparqlDatabase<T = HttpTransport> {
    transport: T,
    cache: QueryCache,
    namespaces: Option<NamespaceRegistry>,
    endpoint: String,
}

impl SparqlDatabase<HttpTransport> {
    /// HTTP client for `endpoint`, caching under `cache_dir` when given
    pub fn connect(endpoint: &str, cache_dir: Option<PathBuf>) -> Result<Self, Error> {
        let transport = HttpTransport::new(endpoint)?;
        let cache = QueryCache::new(cache_dir)?;
        Ok(Self::new(transport, cache).with_endpoint_label(endpoint))
    }
}

impl<T: Transport> SparqlDatabase<T> {
    pub fn new(transport: T, cache: QueryCache) -> Self {
        Self {
            transport,
            cache,
            namespaces: None,
            endpoint: String::new(),
        }
    }

    /// Auto-declare prefixes from `namespaces` in every outgoing query
    pub fn with_autoprefix(mut self, namespaces: NamespaceRegistry) -> Self {
        self.namespaces = Some(namespaces);
        self
    }

    /// Endpoint name used in logs and error metrics
    pub fn with_endpoint_label(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn namespaces(&self) -> Option<&NamespaceRegistry> {
        self.namespaces.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Query text as it will be sent, after prefix injection
    pub fn prepare(&self, query: &str) -> String {
        match &self.namespaces {
            Some(namespaces) => namespaces.inject_prefixes(query),
            None => query.to_string(),
        }
    }

    /// Prepare `query` and serve it from the cache or the transport.
    ///
    /// `on_failure` decides what a transport failure becomes; an `Ok` it
    /// returns is cached like any endpoint answer.
    fn run<E, F>(&self, query: &str, on_failure: F) -> Result<RawResult, E>
    where
        E: From<CacheError>,
        F: FnOnce(TransportError) -> Result<RawResult, E>,
    {
        let query = self.prepare(query);
        let span = query_span(&self.endpoint);
        let _enter = span.enter();

        self.cache.get_or_compute(&query, |query| {
            tracing::debug!(query = %query, "sending query");
            self.transport.execute(query).or_else(on_failure)
        })
    }

    /// Run `query`, surfacing transport failures.
    ///
    /// Failed queries are not cached, so a later call retries the endpoint.
    pub fn try_execute_raw(&self, query: &str) -> Result<RawResult, Error> {
        self.run(query, |error| Err(Error::Transport(error)))
    }

    pub fn try_execute(&self, query: &str) -> Result<ResultSet, Error> {
        self.try_execute_raw(query).map(ResultSet::new)
    }

    /// Run `query`, replacing any transport failure with an empty result.
    ///
    /// The failure is logged with the query text and counted in
    /// [`ERROR_METRICS`], and the empty result is cached in its place: later
    /// calls with the same text never reach the endpoint until the entry is
    /// removed with [`QueryCache::invalidate`]. Through this method an empty
    /// result cannot be told apart from a failed query; use
    /// [`Self::try_execute_raw`] to see the error. Cache I/O errors are always
    /// returned.
    pub fn execute_raw(&self, query: &str) -> Result<RawResult, CacheError> {
        self.run(query, |error| {
            let code = transport_code(&error);
            ERROR_METRICS.record_error(code, Some(&self.endpoint));
            tracing::error!(
                error_code = %code,
                %error,
                query = %query,
                "failed to execute SPARQL query"
            );
            Ok(RawResult::empty())
        })
    }

    pub fn execute(&self, query: &str) -> Result<ResultSet, CacheError> {
        self.execute_raw(query).map(ResultSet::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_transport_failure_degrades_to_empty() {
        let db = SparqlDatabase::new(
            |_: &str| -> Result<RawResult, TransportError> {
                Err(TransportError::Other("connection refused".into()))
            },
            QueryCache::disabled(),
        );
        let rset = db.execute("SELECT * WHERE { ?s ?p ?o }").unwrap();
        assert_eq!(rset.len(), 0);
        assert!(rset.variables().is_empty());
    }

    #[test]
    fn test_try_execute_surfaces_failure() {
        let db = SparqlDatabase::new(
            |_: &str| -> Result<RawResult, TransportError> {
                Err(TransportError::Other("connection refused".into()))
            },
            QueryCache::disabled(),
        );
        let err = db.try_execute("SELECT * WHERE { ?s ?p ?o }").unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Other(_))));
    }

    #[test]
    fn test_autoprefix_rewrites_outgoing_query() {
        let seen = Cell::new(String::new());
        let transport = |query: &str| -> Result<RawResult, TransportError> {
            seen.set(query.to_string());
            Ok(RawResult::empty())
        };
        let db = SparqlDatabase::new(transport, QueryCache::disabled())
            .with_autoprefix(NamespaceRegistry::databnf().clone());
        db.execute("SELECT ?l WHERE {\n ?c skos:prefLabel ?l .\n}").unwrap();
        assert!(seen
            .take()
            .starts_with("PREFIX skos: <http://www.w3.org/2004/02/skos/core#>\n\n"));
    }

    #[test]
    fn test_degraded_result_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Cell::new(0);
        let transport = |_: &str| -> Result<RawResult, TransportError> {
            calls.set(calls.get() + 1);
            Err(TransportError::Other("connection refused".into()))
        };
        let db = SparqlDatabase::new(transport, QueryCache::in_dir(dir.path()).unwrap());

        assert!(db.execute("SELECT * WHERE { ?s ?p ?o }").unwrap().is_empty());
        assert!(db.execute("SELECT * WHERE { ?s ?p ?o }").unwrap().is_empty());
        assert_eq!(calls.get(), 1);
    }
}
