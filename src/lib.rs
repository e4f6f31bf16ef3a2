pub mod config;
pub mod databnf;
pub mod error;
pub mod logging;
pub mod sparql;

pub use config::{CliArgs, ClientConfig, Command};
pub use databnf::{AuthorityFetcher, AuthorityProperties, DATABNF_ENDPOINT, PropertyValue};
pub use error::{ERROR_METRICS, Error, ErrorCode, ErrorMetrics};
pub use logging::{LoggingConfig, init_logging};
pub use sparql::{
    CacheKey, NamespaceRegistry, QueryCache, RawResult, ResultSet, Row, SparqlDatabase, Value,
};

use anyhow::{Context, Result};
use sparql::HttpTransport;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

/// Run one CLI command, writing its JSON output to `out`
pub fn run_command<W: Write>(config: ClientConfig, command: Command, out: &mut W) -> Result<()> {
    match command {
        Command::Query {
            query,
            file,
            autoprefix,
        } => {
            let query = read_query(query, file.as_deref())?;
            let db = open_database(&config)?;
            let db = if autoprefix || config.autoprefix {
                db.with_autoprefix(config.namespaces.clone())
            } else {
                db
            };
            let results = db.try_execute(&query)?;
            let rows: Vec<Row> = results.iter().collect();
            tracing::info!(rows = rows.len(), "query completed");
            serde_json::to_writer_pretty(&mut *out, &rows)?;
        }
        Command::Authority { bnf_id } => {
            let db = open_database(&config)?.with_autoprefix(config.namespaces.clone());
            let props = AuthorityFetcher::new(db).try_fetch(bnf_id)?;
            serde_json::to_writer_pretty(&mut *out, &props)?;
        }
        Command::CacheKey { query } => {
            write!(out, "{}", CacheKey::new(&query).file_name())?;
        }
        Command::ClearCache => {
            let cache = QueryCache::new(config.cache_dir.clone())?;
            let removed = cache.clear()?;
            write!(out, "{removed}")?;
        }
    }
    writeln!(out)?;
    Ok(())
}

fn open_database(config: &ClientConfig) -> Result<SparqlDatabase> {
    let transport = HttpTransport::with_options(
        config.endpoint.as_str(),
        Duration::from_secs(config.timeout_secs),
        &config.user_agent,
    )?;
    let cache = QueryCache::new(config.cache_dir.clone())?;
    Ok(SparqlDatabase::new(transport, cache).with_endpoint_label(config.endpoint.as_str()))
}

fn read_query(inline: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(query) = inline {
        return Ok(query);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read query file {:?}", path));
    }
    let mut query = String::new();
    io::stdin()
        .read_to_string(&mut query)
        .context("failed to read query from stdin")?;
    anyhow::ensure!(!query.trim().is_empty(), "no query given");
    Ok(query)
}
