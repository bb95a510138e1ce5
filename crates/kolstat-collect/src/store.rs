//! Key/value persistence for run state.
//!
//! Accounts, field selection and quota settings all live behind this
//! interface so tests can swap in an in-memory map.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::CollectError;

pub trait PersistenceStore: Send + Sync {
    /// Loads a value by key; `Ok(None)` when the key was never saved.
    ///
    /// # Errors
    ///
    /// [`CollectError::Io`] or [`CollectError::Serde`] on a broken backing file.
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, CollectError>;

    /// Saves a value, replacing any previous one under the same key.
    ///
    /// # Errors
    ///
    /// [`CollectError::Io`] or [`CollectError::Serde`].
    fn save(&self, key: &str, value: serde_json::Value) -> Result<(), CollectError>;
}

/// Store backed by one JSON object file: each key is a top-level member.
/// Reads and rewrites the whole file per operation, which is fine at the
/// sizes involved (tens of accounts, a dozen settings).
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, serde_json::Value>, CollectError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl PersistenceStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, CollectError> {
        Ok(self.read_all()?.remove(key))
    }

    fn save(&self, key: &str, value: serde_json::Value) -> Result<(), CollectError> {
        let mut all = self.read_all()?;
        all.insert(key.to_string(), value);
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(&all)?)?;
        Ok(())
    }
}
