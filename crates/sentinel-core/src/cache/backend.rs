use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use thiserror::Error;

use super::CacheDocument;

/// Failure of a cache backend; the store treats every variant as non-fatal.
#[derive(Debug, Error)]
pub enum CacheBackendError {
    #[error("cache io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache document is not valid json: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache database error: {0}")]
    Database(String),
}

/// Durable medium for the whole cache document.
///
/// Every store operation is one `load` followed by at most one `save`.
pub trait CacheBackend: Send + Sync {
    fn load(&self) -> Result<CacheDocument, CacheBackendError>;

    fn save(&self, document: &CacheDocument) -> Result<(), CacheBackendError>;
}

/// Pretty-printed JSON file, rewritten atomically through a uniquely named
/// sibling temp file so concurrent writers never share a staging path.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> CacheBackendError {
        CacheBackendError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CacheBackend for JsonFileBackend {
    fn load(&self) -> Result<CacheDocument, CacheBackendError> {
        if !self.path.exists() {
            return Ok(CacheDocument::default());
        }

        let raw = fs::read_to_string(&self.path).map_err(|error| self.io_error(error))?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, document: &CacheDocument) -> Result<(), CacheBackendError> {
        let parent = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|error| self.io_error(error))?;

        let body = serde_json::to_string_pretty(document)?;
        let mut staging = NamedTempFile::new_in(parent).map_err(|error| self.io_error(error))?;
        staging
            .write_all(body.as_bytes())
            .map_err(|error| self.io_error(error))?;
        staging
            .persist(&self.path)
            .map(|_| ())
            .map_err(|error| self.io_error(error.error))
    }
}

/// Process-local backend for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    document: Mutex<CacheDocument>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> CacheDocument {
        self.document
            .lock()
            .expect("memory cache backend should not be poisoned")
            .clone()
    }
}

impl CacheBackend for MemoryBackend {
    fn load(&self) -> Result<CacheDocument, CacheBackendError> {
        Ok(self.snapshot())
    }

    fn save(&self, document: &CacheDocument) -> Result<(), CacheBackendError> {
        *self
            .document
            .lock()
            .expect("memory cache backend should not be poisoned") = document.clone();
        Ok(())
    }
}
