// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT


use ietfbib::{
    config::{BuilderConfig, OutputSettings, RegistrySettings, SourceSettings},
    reference::fetch::{FetchError, Transport},
};

use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// In-memory registry serving canned BibTeX records.
///
/// Clones share the same record table and request log, so a test can keep a
/// handle on the registry after handing it to a builder.
#[derive(Debug, Default, Clone)]
pub(crate) struct FakeRegistry {
    records: Rc<RefCell<HashMap<String, String>>>,
    requests: Rc<RefCell<Vec<String>>>,
}

impl FakeRegistry {
    pub(crate) fn serve(&self, url: impl Into<String>, record: impl Into<String>) {
        self.records.borrow_mut().insert(url.into(), record.into());
    }

    pub(crate) fn go_offline(&self) {
        self.records.borrow_mut().clear();
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Transport for FakeRegistry {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.borrow_mut().push(url.into());
        self.records
            .borrow()
            .get(url)
            .map(|record| record.clone().into_bytes())
            .ok_or_else(|| FetchError::Network {
                url: url.into(),
                source: std::io::Error::other("host unreachable").into(),
            })
    }
}

/// Configuration pointing at the fake registry and current directory.
pub(crate) fn fixture_config() -> BuilderConfig {
    BuilderConfig {
        registry: RegistrySettings {
            rfc_url: "mock://rfc/{id}".into(),
            draft_url: "mock://draft/{id}".into(),
            timeout: None,
        },
        sources: SourceSettings::default(),
        output: OutputSettings::default(),
    }
}

/// BibTeX record the registry would serve for an RFC.
pub(crate) fn rfc_record(canonical_key: &str, title: &str) -> String {
    format!(
        "@misc{{{canonical_key},\n    title = {{{{{title}}}}},\n    howpublished = {{{canonical_key}}},\n}}"
    )
}
