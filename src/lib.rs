// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Generate BibTeX entries for IETF documents cited in LaTeX sources.
//!
//! Source documents cite RFCs and Internet-Drafts through ordinary
//! `\cite{...}` directives, e.g., `\cite{rfc8200}` or
//! `\cite{draft-ietf-quic-transport-34}`. ietfbib collects those citation
//! keys, fetches the matching BibTeX records from the IETF datatracker, and
//! writes them all into one bibliography file (`ietf.bib` by default) that
//! can be listed next to a hand-maintained one:
//!
//! ```latex
//! \bibliography{bib,ietf}
//! ```
//!
//! Fetched records are kept in a record store, so later runs only fetch keys
//! that were never seen before.
//!
//! # See Also
//!
//! 1. [`BibliographyBuilder`]
//! 2. [`KeyStore`]

pub mod bibliography;
pub mod config;
pub mod extract;
pub mod path;
pub mod reference;
pub mod store;

pub use bibliography::{BibliographyBuilder, BuildError, BuildReport};
pub use config::BuilderConfig;
pub use reference::{
    classify::classify,
    fetch::{FetchError, RecordFetcher, Transport},
    BibRecord, DraftName, ReferenceKind,
};
pub use store::KeyStore;
