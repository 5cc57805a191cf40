// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bibliography generation.
//!
//! Ties extraction, classification, fetching, and the record store together
//! to produce one bibliography file holding every RFC and Internet-Draft that
//! a set of source documents cites.
//!
//! # Build Pass
//!
//! 1. Collect citation keys from every source document.
//! 2. Take records of already stored keys from the record store.
//! 3. Classify the remaining keys. Unrecognized keys are skipped, as they
//!    belong to some other bibliography file. The rest are fetched.
//! 4. Add fetched records to the record store, and persist it.
//! 5. Reject the pass if two emitted records share a canonical key.
//! 6. Write every record to the bibliography file, each followed by a blank
//!    line.
//!
//! Any failure aborts the pass before the bibliography file is touched. A
//! failed fetch aborts before the record store is touched. Duplicate
//! detection happens after the record store has been persisted, so both
//! colliding keys stay stored until one is removed by hand.

use crate::{
    config::BuilderConfig,
    extract::{discover_sources, extract_keys},
    reference::{
        classify::classify,
        fetch::{HttpTransport, RecordFetcher, Transport},
        BibRecord,
    },
    store::KeyStore,
};

use std::{
    fs::{create_dir_all, write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Summary of a finished build pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Keys taken from the record store.
    pub cached: usize,

    /// Keys fetched from the registry.
    pub fetched: usize,

    /// Keys skipped because they are not RFCs or Internet-Drafts.
    pub unrecognized: usize,

    /// Path of written bibliography file.
    pub bibliography: PathBuf,
}

/// Generate bibliography files from source documents.
#[derive(Debug)]
pub struct BibliographyBuilder<T = HttpTransport>
where
    T: Transport,
{
    config: BuilderConfig,
    store: KeyStore,
    fetcher: RecordFetcher<T>,
}

impl BibliographyBuilder<HttpTransport> {
    /// Construct new bibliography builder fetching over HTTP.
    ///
    /// # Errors
    ///
    /// - Return [`BuildError::Fetch`] if HTTP client cannot be constructed.
    pub fn over_http(config: BuilderConfig) -> Result<Self> {
        let fetcher = RecordFetcher::over_http(config.registry.clone())?;
        Ok(Self::with_fetcher(config, fetcher))
    }
}

impl<T> BibliographyBuilder<T>
where
    T: Transport,
{
    /// Construct new bibliography builder with custom transport.
    ///
    /// Loads the record store named by the configuration.
    pub fn new(config: BuilderConfig, transport: T) -> Self {
        let fetcher = RecordFetcher::new(config.registry.clone(), transport);
        Self::with_fetcher(config, fetcher)
    }

    fn with_fetcher(config: BuilderConfig, fetcher: RecordFetcher<T>) -> Self {
        let store = KeyStore::load(&config.output.store);
        Self {
            config,
            store,
            fetcher,
        }
    }

    /// Record store used by the builder.
    pub fn store(&self) -> &KeyStore {
        &self.store
    }

    /// Run one build pass over source documents.
    ///
    /// If `sources` is empty, every document found in the configured source
    /// directory is used instead.
    ///
    /// # Errors
    ///
    /// - Return [`BuildError::Extract`] if source documents cannot be read.
    /// - Return [`BuildError::Fetch`] if any record cannot be fetched.
    /// - Return [`BuildError::Store`] if record store cannot be persisted.
    /// - Return [`BuildError::DuplicateReference`] if two citation keys refer
    ///   to the same registry entry.
    /// - Return [`BuildError::WriteOutput`] if bibliography cannot be written.
    #[instrument(skip(self, sources), level = "debug")]
    pub fn build(&mut self, sources: &[PathBuf]) -> Result<BuildReport> {
        let sources = if sources.is_empty() {
            discover_sources(&self.config.sources.directory, &self.config.sources.extension)?
        } else {
            sources.to_vec()
        };
        let keys = extract_keys(&sources)?;
        info!("found {} citation keys in {} documents", keys.len(), sources.len());

        let mut records = Vec::new();
        let mut fetched = Vec::new();
        let mut cached = 0;
        let mut unrecognized = 0;
        for key in &keys {
            if self.store.has(key) {
                debug!("use stored record of {key}");
                records.push(self.store.get(key)?.clone());
                cached += 1;
                continue;
            }

            let kind = classify(key);
            if !kind.is_resolvable() {
                debug!("skip unrecognized citation key {key}");
                unrecognized += 1;
                continue;
            }

            let record = self.fetcher.fetch(key, &kind)?;
            records.push(record.clone());
            fetched.push(record);
        }

        let report = BuildReport {
            cached,
            fetched: fetched.len(),
            unrecognized,
            bibliography: self.config.output.bibliography.clone(),
        };

        self.store.upsert_missing(fetched)?;
        self.check_duplicates(&records)?;
        write_bibliography(&report.bibliography, &render(&records))?;

        Ok(report)
    }

    fn check_duplicates(&self, records: &[BibRecord]) -> Result<()> {
        for (index, first) in records.iter().enumerate() {
            for second in &records[index + 1..] {
                if first.canonical_key == second.canonical_key {
                    return Err(BuildError::DuplicateReference {
                        first: first.key.clone(),
                        second: second.key.clone(),
                        canonical_key: first.canonical_key.clone(),
                        store_path: self.store.path().into(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Render records as bibliography text.
///
/// Each record is followed by a blank line.
pub fn render(records: &[BibRecord]) -> String {
    records
        .iter()
        .map(|record| format!("{}\n\n", record.bibtex_data))
        .collect()
}

fn write_bibliography(path: &Path, contents: &str) -> Result<()> {
    let write_output = |err: std::io::Error| BuildError::WriteOutput {
        source: err,
        path: path.into(),
    };

    // INVARIANT: Create parent directories of bibliography if needed.
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(write_output)?;
    }
    write(path, contents).map_err(write_output)?;
    info!("wrote bibliography to {:?}", path.display());

    Ok(())
}

/// Bibliography generation error types.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Source documents cannot be found or read.
    #[error(transparent)]
    Extract(#[from] crate::extract::ExtractError),

    /// Record cannot be fetched from registry.
    #[error(transparent)]
    Fetch(#[from] crate::reference::fetch::FetchError),

    /// Record store cannot be accessed.
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    /// Two citation keys refer to the same registry entry.
    #[error(
        "citation keys {first:?} and {second:?} refer to the same entry {canonical_key:?}, \
         cite only one of them. If the other key is no longer cited, remove it from the \
         record store at {:?}",
        store_path.display()
    )]
    DuplicateReference {
        first: String,
        second: String,
        canonical_key: String,
        store_path: PathBuf,
    },

    /// Bibliography file cannot be written to.
    #[error("failed to write bibliography at {:?}", path.display())]
    WriteOutput {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = BuildError> = std::result::Result<T, E>;
