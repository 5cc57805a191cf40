// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the configuration file that ietfbib uses to know
//! where the registry lives, where source documents are found, and where
//! generated files are written. Every field is optional, a missing field
//! falls back to its default.
//!
//! # General Layout
//!
//! ```toml
//! [registry]
//! rfc_url = "https://datatracker.ietf.org/doc/rfc{id}/bibtex/"
//! draft_url = "https://datatracker.ietf.org/doc/draft-{id}/bibtex/"
//! timeout = 30
//!
//! [sources]
//! directory = "."
//! extension = "tex"
//!
//! [output]
//! bibliography = "ietf.bib"
//! store = ".bibentry.db"
//! ```
//!
//! Registry URLs are templates where `{id}` is substituted by the RFC number
//! or the draft name.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Bibliography builder configuration.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Where to fetch records from.
    pub registry: RegistrySettings,

    /// Where to find source documents.
    pub sources: SourceSettings,

    /// Where to write generated files.
    pub output: OutputSettings,
}

impl BuilderConfig {
    /// Load configuration file at target path.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if file exists but cannot be read.
    /// - Return [`ConfigError::Deserialize`] if file contents are invalid.
    /// - Return [`ConfigError::ShellExpansion`] if a path cannot be expanded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match read_to_string(path) {
            Ok(data) => data.parse(),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no configuration at {}, use defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(ConfigError::Read {
                source: err,
                path: path.into(),
            }),
        }
    }
}

impl FromStr for BuilderConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: BuilderConfig = toml::de::from_str(data)?;

        // INVARIANT: Perform shell expansion on every path field.
        config.sources.directory = expand_path(&config.sources.directory)?;
        config.output.bibliography = expand_path(&config.output.bibliography)?;
        config.output.store = expand_path(&config.output.store)?;

        Ok(config)
    }
}

impl Display for BuilderConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Registry settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// URL template of RFC records.
    pub rfc_url: String,

    /// URL template of Internet-Draft records.
    pub draft_url: String,

    /// Request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl RegistrySettings {
    /// Request timeout, falling back to 30 seconds.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            rfc_url: "https://datatracker.ietf.org/doc/rfc{id}/bibtex/".into(),
            draft_url: "https://datatracker.ietf.org/doc/draft-{id}/bibtex/".into(),
            timeout: None,
        }
    }
}

/// Source document settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Directory searched for documents when none are given explicitly.
    pub directory: PathBuf,

    /// File extension of source documents.
    pub extension: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            extension: "tex".into(),
        }
    }
}

/// Output file settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Generated bibliography file.
    pub bibliography: PathBuf,

    /// Record store file.
    pub store: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            bibliography: PathBuf::from("ietf.bib"),
            store: PathBuf::from(".bibentry.db"),
        }
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let lossy = path.to_string_lossy();
    let expanded = shellexpand::full(lossy.as_ref())?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file cannot be read.
    #[error("failed to read configuration at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
