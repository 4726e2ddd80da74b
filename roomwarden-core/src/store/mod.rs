/*
    store - Durable document persistence

    Provides the key-value durability contract the trust store and room
    registry are built on: load a whole JSON document, replace it
    atomically. Replacement goes through a temp file + rename so a crash
    mid-write never leaves a torn document behind.
*/

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode document: {0}")]
    Encode(String),

    #[error("failed to decode document {path}: {reason}")]
    Decode { path: String, reason: String },
}

/// A single durable JSON document on disk
///
/// Every mutation of the owning component rewrites the whole document;
/// `replace` must complete before the mutation is acknowledged.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    /// Open a document at the given path, creating parent directories
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(DocumentStore { path })
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, returning `T::default()` if the file does not exist yet
    pub fn load<T>(&self) -> StoreResult<T>
    where
        T: DeserializeOwned + Default,
    {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Atomically replace the document contents
    pub fn replace<T>(&self, document: &T) -> StoreResult<()>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|e| StoreError::Encode(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
