use crate::databnf::DATABNF_ENDPOINT;
use crate::sparql::namespaces::NamespaceRegistry;
use crate::sparql::transport::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub cache_dir: Option<PathBuf>,
    /// Auto-declare known prefixes in ad-hoc queries
    pub autoprefix: bool,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// data.bnf.fr table plus any prefixes from the config file
    pub namespaces: NamespaceRegistry,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DATABNF_ENDPOINT.to_string(),
            cache_dir: None,
            autoprefix: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            namespaces: NamespaceRegistry::databnf().clone(),
        }
    }
}

impl ClientConfig {
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let file_config = if let Some(path) = args.config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            endpoint: file_endpoint,
            cache_dir: file_cache_dir,
            autoprefix: file_autoprefix,
            timeout_secs: file_timeout_secs,
            user_agent: file_user_agent,
            namespaces: file_namespaces,
        } = file_config;

        let defaults = Self::default();

        let endpoint = args
            .endpoint
            .clone()
            .or(file_endpoint)
            .map(|endpoint| endpoint.trim().to_string())
            .unwrap_or(defaults.endpoint);

        let cache_dir = args.cache_dir.clone().or(file_cache_dir);

        let autoprefix = file_autoprefix.unwrap_or(defaults.autoprefix);

        let timeout_secs = args
            .timeout_secs
            .or(file_timeout_secs)
            .unwrap_or(defaults.timeout_secs);

        let user_agent = file_user_agent.unwrap_or(defaults.user_agent);

        let namespaces = match file_namespaces {
            Some(extra) if !extra.is_empty() => {
                let extra = NamespaceRegistry::from_pairs(extra)
                    .context("invalid namespaces in config file")?;
                defaults
                    .namespaces
                    .merge(&extra)
                    .context("config file namespaces conflict with data.bnf.fr prefixes")?
            }
            _ => defaults.namespaces,
        };

        Ok(Self {
            endpoint,
            cache_dir,
            autoprefix,
            timeout_secs,
            user_agent,
            namespaces,
        })
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.endpoint.is_empty(), "endpoint must not be empty");
        anyhow::ensure!(
            self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://"),
            "endpoint {:?} is not an http(s) URL",
            self.endpoint
        );
        anyhow::ensure!(self.timeout_secs > 0, "timeout must be at least one second");
        if let Some(dir) = self.cache_dir.as_ref() {
            anyhow::ensure!(
                !dir.exists() || dir.is_dir(),
                "cache directory {:?} exists and is not a directory",
                dir
            );
        }
        Ok(())
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "databnf-sparql",
    about = "Query SPARQL endpoints and data.bnf.fr authority records",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "DATABNF_SPARQL_ENDPOINT",
        value_name = "URL",
        help = "SPARQL endpoint URL",
        global = true
    )]
    pub endpoint: Option<String>,

    #[arg(
        long,
        env = "DATABNF_SPARQL_CACHE_DIR",
        value_name = "DIR",
        help = "Directory where raw query results are cached",
        global = true
    )]
    pub cache_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "DATABNF_SPARQL_TIMEOUT_SECS",
        value_name = "SECS",
        help = "HTTP timeout in seconds",
        value_parser = clap::value_parser!(u64),
        global = true
    )]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a SELECT query and print its rows as JSON
    Query {
        /// Query text; read from --file or stdin when omitted
        query: Option<String>,

        #[arg(long, value_name = "FILE", conflicts_with = "query")]
        file: Option<PathBuf>,

        /// Declare known prefixes used in the query (also enabled by
        /// `autoprefix: true` in the config file)
        #[arg(long)]
        autoprefix: bool,
    },
    /// Fetch every property of a data.bnf.fr authority record
    Authority {
        /// Numeric FRBNF identifier
        bnf_id: u64,
    },
    /// Print the cache file name for a query
    CacheKey {
        query: String,
    },
    /// Remove every cached result
    ClearCache,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    endpoint: Option<String>,
    cache_dir: Option<PathBuf>,
    autoprefix: Option<bool>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
    namespaces: Option<IndexMap<String, String>>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
