//! SPARQL endpoint client
//!
//! This module provides:
//! - Namespace tables for prefix injection and URI qualification
//! - Serde model of SPARQL JSON results
//! - Typed, lazily decoded result rows
//! - Content-addressed result caching on disk
//! - The transport boundary and a blocking HTTP implementation

pub mod cache;
pub mod database;
pub mod namespaces;
pub mod raw;
pub mod result_set;
pub mod transport;
pub mod value;

pub use cache::{CacheError, CacheKey, CacheStats, QueryCache};
pub use database::SparqlDatabase;
pub use namespaces::{NamespaceError, NamespaceRegistry};
pub use raw::{BindingRow, RawBinding, RawResult, TermType, XSD_INTEGER};
pub use result_set::{ResultSet, Row, Rows};
pub use transport::{HttpTransport, Transport, TransportError};
pub use value::{Literal, Value};
