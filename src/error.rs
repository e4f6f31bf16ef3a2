//! Error handling for the SPARQL client
//!
//! This module provides:
//! - A crate-level error aggregating the per-module error types
//! - Error codes with categories and retry hints
//! - Error telemetry, so failures hidden by the degrade-to-empty policy
//!   remain observable

use crate::sparql::cache::CacheError;
use crate::sparql::namespaces::NamespaceError;
use crate::sparql::transport::TransportError;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

// =============================================================================
// ERROR CODES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    /// Endpoint unreachable or connection dropped
    TransportUnavailable,
    /// Endpoint answered with a non-success status
    QueryRejected,
    /// Endpoint answered with something that is not a SPARQL JSON document
    MalformedResponse,
    /// HTTP client could not be configured
    ClientSetup,
    /// Cache directory or entry could not be read or written
    CacheIo,
    /// Cache entry exists but is not a valid result document
    CacheCorrupt,
    /// Namespace table is inconsistent
    InvalidNamespace,
}

impl ErrorCode {
    /// Check if this error type is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::TransportUnavailable | ErrorCode::QueryRejected
        )
    }

    /// Get the error category for metrics
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::TransportUnavailable
            | ErrorCode::QueryRejected
            | ErrorCode::MalformedResponse => "transport_error",
            ErrorCode::ClientSetup | ErrorCode::InvalidNamespace => "configuration_error",
            ErrorCode::CacheIo | ErrorCode::CacheCorrupt => "cache_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// =============================================================================
// CRATE ERROR
// =============================================================================

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Namespace(#[from] NamespaceError),
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Transport(err) => transport_code(err),
            Error::Cache(CacheError::Decode { .. }) => ErrorCode::CacheCorrupt,
            Error::Cache(_) => ErrorCode::CacheIo,
            Error::Namespace(_) => ErrorCode::InvalidNamespace,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub fn transport_code(err: &TransportError) -> ErrorCode {
    match err {
        TransportError::Client(_) => ErrorCode::ClientSetup,
        TransportError::Request { .. } | TransportError::Other(_) => {
            ErrorCode::TransportUnavailable
        }
        TransportError::Rejected { .. } => ErrorCode::QueryRejected,
        TransportError::Malformed { .. } => ErrorCode::MalformedResponse,
    }
}

// =============================================================================
// ERROR TELEMETRY
// =============================================================================

/// Error counters by code, category and endpoint
#[derive(Debug, Default)]
pub struct ErrorMetrics {
    error_counts: RwLock<HashMap<ErrorCode, AtomicU64>>,
    endpoint_errors: RwLock<HashMap<String, AtomicU64>>,
    category_counts: RwLock<HashMap<&'static str, AtomicU64>>,
}

impl ErrorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error occurrence
    pub fn record_error(&self, code: ErrorCode, endpoint: Option<&str>) {
        increment(&self.error_counts, code);
        if let Some(endpoint) = endpoint {
            let map = self.endpoint_errors.read();
            if let Some(counter) = map.get(endpoint) {
                counter.fetch_add(1, Ordering::Relaxed);
            } else {
                drop(map);
                self.endpoint_errors
                    .write()
                    .entry(endpoint.to_string())
                    .or_default()
                    .fetch_add(1, Ordering::Relaxed);
            }
        }
        increment(&self.category_counts, code.category());

        tracing::debug!(
            error_code = %code,
            endpoint = endpoint,
            category = code.category(),
            "error recorded"
        );
    }

    pub fn get_error_count(&self, code: ErrorCode) -> u64 {
        load(&self.error_counts, &code)
    }

    pub fn get_endpoint_error_count(&self, endpoint: &str) -> u64 {
        self.endpoint_errors
            .read()
            .get(endpoint)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn get_category_count(&self, category: &str) -> u64 {
        load(&self.category_counts, category)
    }

    /// Get all error statistics
    pub fn get_stats(&self) -> ErrorStats {
        ErrorStats {
            error_counts: snapshot(&self.error_counts),
            endpoint_errors: snapshot(&self.endpoint_errors),
            category_counts: snapshot(&self.category_counts),
        }
    }

    /// Reset all metrics
    pub fn reset(&self) {
        self.error_counts.write().clear();
        self.endpoint_errors.write().clear();
        self.category_counts.write().clear();
    }
}

fn increment<K>(map: &RwLock<HashMap<K, AtomicU64>>, key: K)
where
    K: std::hash::Hash + Eq,
{
    {
        let read = map.read();
        if let Some(counter) = read.get(&key) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
    }
    map.write()
        .entry(key)
        .or_default()
        .fetch_add(1, Ordering::Relaxed);
}

fn load<K, Q>(map: &RwLock<HashMap<K, AtomicU64>>, key: &Q) -> u64
where
    K: std::borrow::Borrow<Q> + std::hash::Hash + Eq,
    Q: std::hash::Hash + Eq + ?Sized,
{
    map.read()
        .get(key)
        .map(|c| c.load(Ordering::Relaxed))
        .unwrap_or(0)
}

fn snapshot<K: Clone + std::hash::Hash + Eq>(map: &RwLock<HashMap<K, AtomicU64>>) -> HashMap<K, u64> {
    map.read()
        .iter()
        .map(|(key, counter)| (key.clone(), counter.load(Ordering::Relaxed)))
        .collect()
}

/// Error statistics snapshot
#[derive(Debug, Clone, Serialize)]
pub struct ErrorStats {
    pub error_counts: HashMap<ErrorCode, u64>,
    pub endpoint_errors: HashMap<String, u64>,
    pub category_counts: HashMap<&'static str, u64>,
}

/// Global error metrics instance
pub static ERROR_METRICS: once_cell::sync::Lazy<ErrorMetrics> =
    once_cell::sync::Lazy::new(ErrorMetrics::new);

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_categories() {
        assert_eq!(ErrorCode::QueryRejected.category(), "transport_error");
        assert_eq!(ErrorCode::CacheCorrupt.category(), "cache_error");
        assert_eq!(ErrorCode::InvalidNamespace.category(), "configuration_error");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(ErrorCode::TransportUnavailable.is_retryable());
        assert!(ErrorCode::QueryRejected.is_retryable());
        assert!(!ErrorCode::MalformedResponse.is_retryable());
        assert!(!ErrorCode::CacheIo.is_retryable());
    }

    #[test]
    fn test_error_codes_from_variants() {
        let err = Error::from(TransportError::Rejected {
            endpoint: "http://example.org/sparql".into(),
            status: 400,
            body: "bad query".into(),
        });
        assert_eq!(err.code(), ErrorCode::QueryRejected);
        assert!(err.is_retryable());

        let err = Error::from(CacheError::Read {
            path: PathBuf::from("/nope"),
            source: std::io::Error::other("denied"),
        });
        assert_eq!(err.code(), ErrorCode::CacheIo);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_metrics() {
        let metrics = ErrorMetrics::new();

        metrics.record_error(ErrorCode::QueryRejected, Some("http://a/sparql"));
        metrics.record_error(ErrorCode::QueryRejected, Some("http://a/sparql"));
        metrics.record_error(ErrorCode::CacheIo, None);

        assert_eq!(metrics.get_error_count(ErrorCode::QueryRejected), 2);
        assert_eq!(metrics.get_error_count(ErrorCode::CacheIo), 1);
        assert_eq!(metrics.get_endpoint_error_count("http://a/sparql"), 2);
        assert_eq!(metrics.get_category_count("transport_error"), 2);

        let stats = metrics.get_stats();
        assert_eq!(stats.category_counts.get("cache_error"), Some(&1));

        metrics.reset();
        assert_eq!(metrics.get_error_count(ErrorCode::QueryRejected), 0);
    }
}
