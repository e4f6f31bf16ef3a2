// =============================================================================
// SPARQL Transport
// =============================================================================
// Opaque `execute(query) -> RawResult` boundary plus a blocking HTTP client
// for the SPARQL 1.1 protocol.

use super::raw::RawResult;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_USER_AGENT: &str = concat!("databnf-sparql/", env!("CARGO_PKG_VERSION"));

/// Failures talking to an endpoint
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("endpoint {endpoint} rejected the query with status {status}: {body}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("malformed response from {endpoint}: {source}")]
    Malformed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Executes a query string against a remote endpoint
pub trait Transport {
    fn execute(&self, query: &str) -> Result<RawResult, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&str) -> Result<RawResult, TransportError>,
{
    fn execute(&self, query: &str) -> Result<RawResult, TransportError> {
        self(query)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, query: &str) -> Result<RawResult, TransportError> {
        (**self).execute(query)
    }
}

/// Blocking SPARQL protocol client (query via GET, JSON results)
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_options(
            endpoint,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            DEFAULT_USER_AGENT,
        )
    }

    pub fn with_options(
        endpoint: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn execute(&self, query: &str) -> Result<RawResult, TransportError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query), ("format", "json")])
            .header(reqwest::header::ACCEPT, SPARQL_RESULTS_JSON)
            .send()
            .map_err(|source| TransportError::Request {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().map_err(|source| TransportError::Request {
            endpoint: self.endpoint.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(TransportError::Rejected {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| TransportError::Malformed {
            endpoint: self.endpoint.clone(),
            source,
        })
    }
}
