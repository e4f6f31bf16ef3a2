// =============================================================================
// SPARQL Query Result Cache
// =============================================================================
// Content-addressed, file-backed cache: one pretty-printed JSON file per
// distinct query text, named by the SHA-256 of that text.

use super::raw::RawResult;
use crate::log_cache_operation;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

const ENTRY_EXTENSION: &str = "json";

/// Cache I/O failures. These indicate a misconfigured cache and are never
/// swallowed.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to create cache directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read cache entry {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode cache entry {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode cache entry {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write cache entry {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Cache key (SHA-256 hash of query text, lower-case hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(query: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(query.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the cache file holding this entry
    pub fn file_name(&self) -> String {
        format!("{}.{ENTRY_EXTENSION}", self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
}

/// File-backed query result cache.
///
/// Identical query text (byte for byte) always maps to the same entry; no
/// normalization is applied. Processes sharing a directory are not
/// coordinated: two simultaneous misses both run the query and the last
/// rename wins. Entries are written to a temp file and renamed into place,
/// so a reader never observes a partial entry.
#[derive(Debug, Default)]
pub struct QueryCache {
    dir: Option<PathBuf>,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl QueryCache {
    /// Create a cache rooted at `dir`, or a pass-through cache when `None`.
    ///
    /// The directory and its parents are created if missing.
    ///
    /// # Errors
    /// Returns `Err` if the directory cannot be created.
    pub fn new(dir: Option<PathBuf>) -> Result<Self, CacheError> {
        match dir {
            Some(dir) => Self::in_dir(dir),
            None => Ok(Self::disabled()),
        }
    }

    /// Cache rooted at `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        if !dir.is_dir() {
            fs::create_dir_all(&dir).map_err(|source| CacheError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            tracing::debug!(dir = %dir.display(), "created cache directory");
        }
        Ok(Self {
            dir: Some(dir),
            ..Self::default()
        })
    }

    /// Pass-through cache that never touches the filesystem
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Path of the entry for `query`, if caching is enabled
    pub fn entry_path(&self, query: &str) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(CacheKey::new(query).file_name()))
    }

    /// Return the cached result for `query`, or run `compute` and persist its
    /// result.
    ///
    /// When caching is disabled `compute` always runs and nothing is written.
    /// A `compute` error is returned as is and nothing is cached.
    pub fn get_or_compute<F, E>(&self, query: &str, compute: F) -> Result<RawResult, E>
    where
        F: FnOnce(&str) -> Result<RawResult, E>,
        E: From<CacheError>,
    {
        let Some(dir) = self.dir.as_deref() else {
            return compute(query);
        };

        let key = CacheKey::new(query);
        let path = dir.join(key.file_name());

        if path.is_file() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log_cache_operation!(hit, key, path = %path.display());
            return Ok(read_entry(&path)?);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        log_cache_operation!(miss, key, path = %path.display());

        let result = compute(query)?;
        write_entry(dir, &path, &result)?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(result)
    }

    /// Cached result for `query`, without computing anything
    pub fn lookup(&self, query: &str) -> Result<Option<RawResult>, CacheError> {
        match self.entry_path(query) {
            Some(path) if path.is_file() => read_entry(&path).map(Some),
            _ => Ok(None),
        }
    }

    /// Persist `result` as the entry for `query`. No-op when disabled.
    pub fn store(&self, query: &str, result: &RawResult) -> Result<(), CacheError> {
        let Some(dir) = self.dir.as_deref() else {
            return Ok(());
        };
        let path = dir.join(CacheKey::new(query).file_name());
        write_entry(dir, &path, result)?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Remove the entry for `query`; returns whether one existed
    pub fn invalidate(&self, query: &str) -> Result<bool, CacheError> {
        let Some(path) = self.entry_path(query) else {
            return Ok(false);
        };
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Write { path, source }),
        }
    }

    /// Remove every `*.json` entry in the cache directory; returns how many
    pub fn clear(&self) -> Result<usize, CacheError> {
        let Some(dir) = self.dir.as_deref() else {
            return Ok(0);
        };
        let entries = fs::read_dir(dir).map_err(|source| CacheError::Read {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|source| CacheError::Read {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let is_entry = path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == ENTRY_EXTENSION);
            if !is_entry {
                continue;
            }
            fs::remove_file(&path).map_err(|source| CacheError::Write {
                path: path.clone(),
                source,
            })?;
            removed += 1;
        }

        tracing::info!(dir = %dir.display(), removed, "cache cleared");
        Ok(removed)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}

fn read_entry(path: &Path) -> Result<RawResult, CacheError> {
    let file = fs::File::open(path).map_err(|source| CacheError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CacheError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn write_entry(dir: &Path, path: &Path, result: &RawResult) -> Result<(), CacheError> {
    let write_err = |source: io::Error| CacheError::Write {
        path: path.to_path_buf(),
        source,
    };

    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, result).map_err(|source| {
            CacheError::Encode {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writer.flush().map_err(write_err)?;
    }
    tmp.persist(path).map_err(|err| write_err(err.error))?;
    Ok(())
}
