use chrono::{DateTime, Utc};
use colligo_core::HeaderMapping;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt store document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A confirmed column mapping, memoized under its structure signature so a
/// repeat upload of the same file shape skips straight past inference.
/// Consumers treat everything beyond `mapping` as opaque bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMapping {
    pub mapping: HeaderMapping,
    pub structure_sig: String,
    pub mapping_sig: String,
    pub created_at: DateTime<Utc>,
}

/// Signature-token keyed persistence. Single writer by assumption (one user
/// session); implementations do not lock.
pub trait MappingStore {
    fn get(&self, key: &str) -> Option<SavedMapping>;
    fn set(&mut self, key: &str, value: SavedMapping) -> Result<(), StoreError>;
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, SavedMapping>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MappingStore for MemoryStore {
    fn get(&self, key: &str) -> Option<SavedMapping> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: SavedMapping) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Whole-document JSON store: loaded once on open, rewritten on every
/// mutation. Proportionate to a per-user mapping memo of at most a few dozen
/// entries.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: HashMap<String, SavedMapping>,
}

impl JsonFileStore {
    /// Open or create the store at `path`. A missing or empty file is an
    /// empty store; unparseable content is an error, not silent data loss.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => HashMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(JsonFileStore { path, entries })
    }

    fn flush(&self) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

impl MappingStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<SavedMapping> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: SavedMapping) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
