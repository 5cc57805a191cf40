// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Record store management.
//!
//! Records fetched from the registry are kept in a __record store__, so that
//! later runs only need to fetch citation keys they have never seen before.
//! The store maps each citation key to its resolved record.
//!
//! # Resolve Once
//!
//! A citation key is resolved exactly once. Once a record is in the store it
//! is never replaced, even if the registry would now serve something
//! different. Remove the key from the store to have it fetched again.
//!
//! # Store File Layout
//!
//! The store lives in a single file (`.bibentry.db` by default) that is
//! loaded once at startup, and rewritten as a whole after every update. The
//! file contents are an implementation detail. A missing, truncated, or
//! otherwise unreadable store file simply yields an empty store, as the store
//! is only a cache of what the registry serves.
//!
//! There is no locking. Running two builders against the same store file at
//! the same time may lose records.

use crate::reference::BibRecord;

use std::{
    collections::BTreeMap,
    fs::{create_dir_all, read, write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Persistent mapping of citation keys to resolved records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStore {
    store_path: PathBuf,
    records: BTreeMap<String, BibRecord>,
}

impl KeyStore {
    /// Load record store from target path.
    ///
    /// Never fails. A store file that cannot be read or decoded yields an
    /// empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let store_path = path.into();
        let records = match read(&store_path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!(
                    "discard unreadable record store at {:?}: {err}",
                    store_path.display()
                );
                BTreeMap::new()
            }),
            Err(err) => {
                debug!("start empty record store at {:?}: {err}", store_path.display());
                BTreeMap::new()
            }
        };

        Self {
            store_path,
            records,
        }
    }

    /// Path of backing store file.
    pub fn path(&self) -> &Path {
        self.store_path.as_path()
    }

    /// Check if citation key has a record.
    pub fn has(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Get record of citation key.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NotFound`] if key has no record.
    pub fn get(&self, key: &str) -> Result<&BibRecord> {
        self.records.get(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })
    }

    /// Iterate over stored citation keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert records whose citation key is not stored yet, then persist.
    ///
    /// Records for keys that are already stored are dropped, the stored
    /// record always wins. The whole store is written back once, after the
    /// entire batch has been processed.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Serialize`] if store cannot be encoded.
    /// - Return [`StoreError::Write`] if store file cannot be written.
    pub fn upsert_missing(&mut self, records: impl IntoIterator<Item = BibRecord>) -> Result<()> {
        for record in records {
            if self.records.contains_key(&record.key) {
                debug!("keep stored record of {}", record.key);
                continue;
            }

            debug!("store record of {}", record.key);
            self.records.insert(record.key.clone(), record);
        }

        self.save()
    }

    /// Remove record of citation key, returning it if it was stored.
    ///
    /// The change only reaches the store file through [`KeyStore::save`].
    pub fn remove(&mut self, key: &str) -> Option<BibRecord> {
        self.records.remove(key)
    }

    /// Write entire store to backing store file.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Serialize`] if store cannot be encoded.
    /// - Return [`StoreError::Write`] if store file cannot be written.
    pub fn save(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.records)?;

        // INVARIANT: Create parent directories of store file if needed.
        if let Some(parent) = self.store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent).map_err(|err| StoreError::Write {
                source: err,
                store_path: self.store_path.clone(),
            })?;
        }

        write(&self.store_path, bytes).map_err(|err| StoreError::Write {
            source: err,
            store_path: self.store_path.clone(),
        })?;
        info!(
            "saved {} records to {:?}",
            self.records.len(),
            self.store_path.display()
        );

        Ok(())
    }
}

/// All possible error types for record store interaction.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Citation key has no record in store.
    #[error("no record stored for citation key {key:?}")]
    NotFound { key: String },

    /// Store cannot be encoded.
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    /// Store file cannot be written to.
    #[error("failed to write record store at {:?}", store_path.display())]
    Write {
        #[source]
        source: std::io::Error,
        store_path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
