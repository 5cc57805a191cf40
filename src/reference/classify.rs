// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Citation key classification.
//!
//! Determine which kind of IETF document a citation key refers to just by
//! looking at the key itself. No network access is involved.
//!
//! # RFC Keys
//!
//! An RFC key is exactly seven characters long: a three character prefix of
//! either "rfc" or "RFC", followed by a zero padded four digit RFC number,
//! e.g., "rfc0791" or "RFC8200".
//!
//! # Internet-Draft Keys
//!
//! An Internet-Draft key starts with either "I-D." or "draft-". The rest of
//! the key is the draft name, optionally followed by a hyphen and a version
//! number, e.g., "draft-ietf-quic-transport-34".

use crate::reference::{DraftName, ReferenceKind};

use tracing::debug;

const RFC_PREFIXES: [&str; 2] = ["rfc", "RFC"];
const RFC_KEY_LEN: usize = 7;

// INVARIANT: Checked in this order.
const DRAFT_PREFIXES: [&str; 2] = ["I-D.", "draft-"];

/// Classify citation key into the kind of document it refers to.
pub fn classify(key: &str) -> ReferenceKind {
    let kind = if let Some(number) = rfc_number(key) {
        ReferenceKind::Rfc(number.to_string())
    } else if let Some(name) = draft_name(key) {
        ReferenceKind::InternetDraft(name)
    } else {
        ReferenceKind::Unrecognized
    };
    debug!("classify {key:?} as {kind:?}");

    kind
}

/// Extract RFC number from citation key.
///
/// Returns [`None`] if the key is not an RFC key.
pub fn rfc_number(key: &str) -> Option<&str> {
    if key.len() != RFC_KEY_LEN {
        return None;
    }

    RFC_PREFIXES
        .iter()
        .find_map(|prefix| key.strip_prefix(prefix))
        .filter(|number| is_number(number))
}

/// Decompose Internet-Draft citation key into id and version.
///
/// Returns [`None`] if the key does not start with a draft prefix.
pub fn draft_name(key: &str) -> Option<DraftName> {
    let rest = DRAFT_PREFIXES
        .iter()
        .find_map(|prefix| key.strip_prefix(prefix))?;

    // INVARIANT: Version is only taken from last hyphen-delimited segment.
    //   - A name without any hyphen never has a version.
    let (id, version) = match rest.rsplit_once('-') {
        Some((id, segment)) if is_number(segment) => (id, segment.parse().ok()),
        _ => (rest, None),
    };

    // INVARIANT: Segment too large for a version stays part of the id.
    let id = if version.is_none() { rest } else { id };

    Some(DraftName {
        id: id.to_string(),
        version,
    })
}

fn is_number(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit())
}
