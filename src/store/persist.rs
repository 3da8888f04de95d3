//! Durable snapshots of client state.
//!
//! Every store that needs to survive a restart is wrapped in [`Persistent`],
//! which writes the whole value as one named JSON blob after each mutation
//! and reads it back whole on startup.

use std::fs;
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode or decode {path}: {source}")]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A directory of named JSON blobs.
#[derive(Debug, Clone)]
pub struct StateStorage {
    root: PathBuf,
}

impl StateStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    /// Reads the blob called `name`. A missing blob is `Ok(None)`.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StorageError> {
        let path = self.blob_path(name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Serde { path, source })
    }

    /// Writes `value` as the blob called `name`, replacing any previous one.
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(|source| StorageError::Io {
            path: self.root.clone(),
            source,
        })?;
        let path = self.blob_path(name);
        let encoded = serde_json::to_string_pretty(value).map_err(|source| StorageError::Serde {
            path: path.clone(),
            source,
        })?;
        // Write then rename so a crash never leaves half a blob behind.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, encoded).map_err(|source| StorageError::Io {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|source| StorageError::Io { path, source })
    }
}

/// A store value that is saved after every mutation.
///
/// Reads go through `Deref`; writes must go through [`Persistent::update`].
pub struct Persistent<T> {
    name: &'static str,
    storage: Option<StateStorage>,
    value: T,
}

impl<T> Persistent<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Loads the blob `name` from `storage`, falling back to `T::default()`
    /// when it is missing or unreadable.
    pub fn rehydrate(storage: StateStorage, name: &'static str) -> Self {
        let value = match storage.load::<T>(name) {
            Ok(Some(value)) => {
                debug!("Rehydrated {} from {}", name, storage.root().display());
                value
            }
            Ok(None) => T::default(),
            Err(err) => {
                warn!("Discarding unreadable state {}: {}", name, err);
                T::default()
            }
        };
        Self {
            name,
            storage: Some(storage),
            value,
        }
    }

    /// A store that is never written to disk.
    pub fn in_memory(name: &'static str, value: T) -> Self {
        Self {
            name,
            storage: None,
            value,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Applies `f` to the value and persists the result.
    ///
    /// A failed write is logged and otherwise ignored; the in-memory value
    /// stays authoritative for the rest of the session.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.value);
        self.persist();
        result
    }

    fn persist(&self) {
        if let Some(storage) = &self.storage
            && let Err(err) = storage.save(self.name, &self.value)
        {
            warn!("Failed to persist {}: {}", self.name, err);
        }
    }
}

impl<T> Deref for Persistent<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}
