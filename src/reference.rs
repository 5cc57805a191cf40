// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! IETF reference representation.
//!
//! A __citation key__ is the token a document uses at the point of citation,
//! e.g., `\cite{rfc8200}`. Only two families of citation keys are resolved
//! automatically: RFCs and Internet-Drafts. Everything else is considered to
//! be handled by some other bibliography file that ietfbib does not manage.
//!
//! # Canonical Keys
//!
//! The registry labels each record it serves with its own key, e.g., the
//! record for `\cite{rfc8200}` may be declared as `@misc{rfc8200,` or as
//! `@techreport{RFC8200,`. This label is the __canonical key__. Before a
//! record is stored, every occurrence of the canonical key is replaced with
//! the citation key, so that the emitted entry matches the name used in the
//! document.
//!
//! Two different citation keys can still point at the same canonical key,
//! e.g., `\cite{RFC8200}` and `\cite{rfc8200}`. Emitting both would produce
//! duplicated entries in the final bibliography, so the canonical key is kept
//! around to detect that condition.
//!
//! # See Also
//!
//! 1. [`classify`]
//! 2. [`fetch`]

pub mod classify;
pub mod fetch;

use serde::{Deserialize, Serialize};

/// Kind of document a citation key refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Request for Comments, e.g., `rfc8200` or `RFC0791`.
    ///
    /// Holds the four digit RFC number exactly as written in the key.
    Rfc(String),

    /// Internet-Draft, e.g., `draft-ietf-quic-transport-34` or `I-D.foo`.
    InternetDraft(DraftName),

    /// Key cannot be resolved through the registry.
    Unrecognized,
}

impl ReferenceKind {
    /// Check if citation key can be fetched from the registry.
    pub fn is_resolvable(&self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}

/// Decomposed Internet-Draft citation key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftName {
    /// Name of the draft without prefix or version.
    pub id: String,

    /// Trailing version number, if the key carries one.
    pub version: Option<u32>,
}

/// Resolved bibliographic record.
///
/// The record text has already been rewritten to use the citation key in
/// place of the canonical key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BibRecord {
    /// Citation key the record is displayed under.
    pub key: String,

    /// Key the registry itself labeled the record with.
    pub canonical_key: String,

    /// BibTeX text of the record.
    pub bibtex_data: String,
}

impl BibRecord {
    /// Construct new record from raw registry text.
    ///
    /// Replaces every occurrence of `canonical_key` in `raw` with `key`.
    pub fn new(key: impl Into<String>, canonical_key: impl Into<String>, raw: &str) -> Self {
        let key = key.into();
        let canonical_key = canonical_key.into();
        let bibtex_data = raw.replace(canonical_key.as_str(), key.as_str());

        Self {
            key,
            canonical_key,
            bibtex_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn bib_record_replaces_every_canonical_key() {
        let raw = indoc! {r#"
            @misc{RFC8200,
                series = {Request for Comments},
                url = {https://www.rfc-editor.org/info/RFC8200},
            }
        "#};
        let result = BibRecord::new("rfc8200", "RFC8200", raw);
        let expect = indoc! {r#"
            @misc{rfc8200,
                series = {Request for Comments},
                url = {https://www.rfc-editor.org/info/rfc8200},
            }
        "#};

        assert_eq!(result.bibtex_data, expect);
        assert_eq!(result.canonical_key, "RFC8200");
        assert_eq!(result.key, "rfc8200");
    }
}
