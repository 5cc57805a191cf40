// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Citation key extraction.
//!
//! Scan source documents for `\cite{...}` directives and collect every
//! citation key they reference. A single directive may list several keys
//! separated by commas, e.g., `\cite{rfc8200, draft-ietf-6man-rfc4291bis}`.
//!
//! Directives are matched line by line, so a directive split across lines is
//! not picked up. Byte sequences that are not valid UTF-8 are skipped rather
//! than failing the whole extraction.

use regex::Regex;
use std::{
    collections::BTreeSet,
    fs::read,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use tracing::{debug, instrument, warn};

static CITE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\cite\{([^}]*)\}").expect("valid cite directive pattern"));

/// Find every source document with target extension in a directory.
///
/// Only the top-level of the directory is searched. Paths are returned in
/// sorted order.
///
/// # Errors
///
/// - Return [`ExtractError::Pattern`] if directory forms an invalid pattern.
/// - Return [`ExtractError::Discover`] if directory entries cannot be read.
pub fn discover_sources(directory: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
    let directory = glob::Pattern::escape(directory.as_ref().to_string_lossy().as_ref());
    let pattern = format!("{directory}/*.{}", glob::Pattern::escape(extension));

    let mut sources = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        if path.is_file() {
            sources.push(path);
        }
    }
    sources.sort();
    debug!("discovered sources {sources:?}");

    Ok(sources)
}

/// Collect distinct citation keys referenced by source documents.
///
/// # Errors
///
/// - Return [`ExtractError::ReadSource`] if a document cannot be read.
#[instrument(skip(sources), level = "debug")]
pub fn extract_keys(
    sources: impl IntoIterator<Item = impl AsRef<Path>>,
) -> Result<BTreeSet<String>> {
    let mut keys = BTreeSet::new();
    for source in sources {
        let source = source.as_ref();
        let bytes = read(source).map_err(|err| ExtractError::ReadSource {
            source: err,
            path: source.into(),
        })?;
        let text = decode_lossy(source, &bytes);
        keys.extend(keys_in(&text));
    }

    Ok(keys)
}

/// Collect citation keys of every `\cite{...}` directive in text.
pub fn keys_in(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines()
        .flat_map(|line| CITE_DIRECTIVE.captures_iter(line))
        .filter_map(|captures| captures.get(1))
        .flat_map(|keys| keys.as_str().split(','))
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ToString::to_string)
}

fn decode_lossy(path: &Path, bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    let mut skipped = 0;
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        skipped += chunk.invalid().len();
    }

    if skipped > 0 {
        warn!("skipped {skipped} invalid UTF-8 bytes in {}", path.display());
    }

    text
}

/// Citation key extraction error types.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Source document cannot be read.
    #[error("failed to read source document at {:?}", path.display())]
    ReadSource {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Source directory forms an invalid glob pattern.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Source directory cannot be listed.
    #[error(transparent)]
    Discover(#[from] glob::GlobError),
}

/// Friendly result alias :3
pub type Result<T, E = ExtractError> = std::result::Result<T, E>;
