// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Registry record fetching.
//!
//! Utilities to retrieve BibTeX records for classified citation keys from the
//! registry. Each request is a plain blocking GET. Nothing is retried, the
//! caller decides whether a failed fetch aborts its work.
//!
//! Draft URLs are built from the draft id alone, the version number of the
//! citation key is not part of the request. The registry answers such
//! requests with its latest revision of the draft.

use crate::{
    config::RegistrySettings,
    reference::{BibRecord, ReferenceKind},
};

use regex::Regex;
use reqwest::{blocking::Client, redirect::Policy};
use std::{sync::LazyLock, time::Duration};
use tracing::{debug, info, instrument};

static CANONICAL_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[a-z]*\{([^,]*),").expect("valid canonical key pattern"));

/// Placeholder in registry URL templates for the document identifier.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Layer of indirection for registry access.
pub trait Transport {
    /// Retrieve raw response body at target URL.
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// Registry access through blocking HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Construct new HTTP transport with given request timeout.
    ///
    /// # Errors
    ///
    /// - Return [`FetchError::Client`] if HTTP client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(10))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let network = |err: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            source: err.into(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(network)?;
        let body = response.bytes().map_err(network)?;

        Ok(body.to_vec())
    }
}

/// Fetch BibTeX records from the registry.
#[derive(Debug)]
pub struct RecordFetcher<T = HttpTransport>
where
    T: Transport,
{
    settings: RegistrySettings,
    transport: T,
}

impl RecordFetcher<HttpTransport> {
    /// Construct new record fetcher over HTTP.
    ///
    /// # Errors
    ///
    /// - Return [`FetchError::Client`] if HTTP client cannot be constructed.
    pub fn over_http(settings: RegistrySettings) -> Result<Self> {
        let transport = HttpTransport::new(settings.timeout())?;
        Ok(Self::new(settings, transport))
    }
}

impl<T> RecordFetcher<T>
where
    T: Transport,
{
    /// Construct new record fetcher with custom transport.
    pub fn new(settings: RegistrySettings, transport: T) -> Self {
        Self {
            settings,
            transport,
        }
    }

    /// Determine registry URL of the record for a classified key.
    ///
    /// # Errors
    ///
    /// - Return [`FetchError::UnsupportedKind`] if key is unrecognized.
    pub fn record_url(&self, key: &str, kind: &ReferenceKind) -> Result<String> {
        match kind {
            ReferenceKind::Rfc(number) => Ok(expand(&self.settings.rfc_url, number)),
            ReferenceKind::InternetDraft(name) => Ok(expand(&self.settings.draft_url, &name.id)),
            ReferenceKind::Unrecognized => Err(FetchError::UnsupportedKind {
                key: key.to_string(),
            }),
        }
    }

    /// Fetch record of citation key from registry.
    ///
    /// The record is rewritten such that every occurrence of the canonical
    /// key the registry uses is replaced by `key`.
    ///
    /// # Errors
    ///
    /// - Return [`FetchError::UnsupportedKind`] if key is unrecognized.
    /// - Return [`FetchError::Network`] if registry cannot be reached.
    /// - Return [`FetchError::Encoding`] if response is not UTF-8.
    /// - Return [`FetchError::MalformedRecord`] if response lacks a
    ///   canonical key declaration.
    #[instrument(skip(self, kind), level = "debug")]
    pub fn fetch(&self, key: &str, kind: &ReferenceKind) -> Result<BibRecord> {
        let url = self.record_url(key, kind)?;
        info!("fetch {key} from {url}");

        let body = self.transport.get(&url)?;
        let raw = String::from_utf8(body).map_err(|err| FetchError::Encoding {
            url: url.clone(),
            source: err,
        })?;
        debug!("registry record:\n{raw}");

        let canonical_key = canonical_key(&raw).ok_or_else(|| FetchError::MalformedRecord {
            url: url.clone(),
        })?;
        debug!("canonical key of {key} is {canonical_key}");

        Ok(BibRecord::new(key, canonical_key, &raw))
    }
}

/// Extract the key a BibTeX record declares itself with.
///
/// Only the first entry declaration is considered. An empty key is treated as
/// no key at all.
pub fn canonical_key(record: &str) -> Option<&str> {
    CANONICAL_KEY
        .captures(record)
        .and_then(|captures| captures.get(1))
        .map(|key| key.as_str())
        .filter(|key| !key.is_empty())
}

fn expand(template: &str, id: &str) -> String {
    template.replace(ID_PLACEHOLDER, id)
}

/// Record fetching error types.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Citation key cannot be resolved through the registry.
    #[error("citation key {key:?} does not refer to an RFC or Internet-Draft")]
    UnsupportedKind { key: String },

    /// HTTP client cannot be constructed.
    #[error("failed to construct HTTP client")]
    Client(#[source] reqwest::Error),

    /// Registry cannot be reached, or refused the request.
    #[error("failed to fetch {url}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Registry response is not valid UTF-8.
    #[error("response from {url} is not valid UTF-8")]
    Encoding {
        url: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Registry response lacks an entry declaration.
    #[error("response from {url} does not declare a BibTeX entry key")]
    MalformedRecord { url: String },
}

/// Friendly result alias :3
pub type Result<T, E = FetchError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::classify::classify;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::{
        cell::RefCell,
        collections::HashMap,
        io::{BufRead, BufReader, Write},
        net::{SocketAddr, TcpListener},
        thread::{self, JoinHandle},
    };

    #[derive(Default)]
    struct FakeTransport {
        bodies: HashMap<String, Vec<u8>>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeTransport {
        fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
            self.bodies.insert(url.into(), body.into());
            self
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, url: &str) -> Result<Vec<u8>> {
            self.requests.borrow_mut().push(url.into());
            self.bodies
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Network {
                    url: url.into(),
                    source: std::io::Error::other("host unreachable").into(),
                })
        }
    }

    fn settings() -> RegistrySettings {
        RegistrySettings {
            rfc_url: "mock://rfc/{id}".into(),
            draft_url: "mock://draft/{id}".into(),
            timeout: None,
        }
    }

    fn local_settings(addr: SocketAddr) -> RegistrySettings {
        RegistrySettings {
            rfc_url: format!("http://{addr}/doc/rfc{{id}}/bibtex/"),
            draft_url: format!("http://{addr}/doc/draft-{{id}}/bibtex/"),
            timeout: Some(5),
        }
    }

    // Answer exactly one request with a canned response, handing back the
    // request line that was received.
    fn serve_once(status: &str, body: &str) -> anyhow::Result<(SocketAddr, JoinHandle<String>)> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return String::new();
            };
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut request_line = String::new();
            let _ = reader.read_line(&mut request_line);
            loop {
                let mut header = String::new();
                match reader.read_line(&mut header) {
                    Ok(0) => break,
                    Ok(_) if header == "\r\n" => break,
                    Ok(_) => continue,
                    Err(_) => break,
                }
            }
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();

            request_line.trim_end().to_string()
        });

        Ok((addr, handle))
    }

    #[test]
    fn fetch_rfc_record() -> anyhow::Result<()> {
        let transport = FakeTransport::default().with(
            "mock://rfc/0791",
            indoc! {r#"
                @misc{rfc791,
                    title = {{Internet Protocol}},
                    url = {https://www.rfc-editor.org/info/rfc791},
                }
            "#},
        );
        let fetcher = RecordFetcher::new(settings(), transport);
        let result = fetcher.fetch("RFC0791", &classify("RFC0791"))?;
        let expect = BibRecord {
            key: "RFC0791".into(),
            canonical_key: "rfc791".into(),
            bibtex_data: indoc! {r#"
                @misc{RFC0791,
                    title = {{Internet Protocol}},
                    url = {https://www.rfc-editor.org/info/RFC0791},
                }
            "#}
            .into(),
        };
        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn fetch_draft_ignores_version() -> anyhow::Result<()> {
        let transport = FakeTransport::default().with(
            "mock://draft/ietf-quic-transport",
            "@techreport{ietf-quic-transport-34,\n}\n",
        );
        let fetcher = RecordFetcher::new(settings(), transport);
        let key = "draft-ietf-quic-transport-34";
        let result = fetcher.fetch(key, &classify(key))?;

        assert_eq!(
            fetcher.transport.requests.borrow().as_slice(),
            ["mock://draft/ietf-quic-transport"]
        );
        assert_eq!(result.canonical_key, "ietf-quic-transport-34");
        assert_eq!(result.bibtex_data, "@techreport{draft-ietf-quic-transport-34,\n}\n");

        Ok(())
    }

    #[test]
    fn fetch_unrecognized_is_rejected() {
        let fetcher = RecordFetcher::new(settings(), FakeTransport::default());
        let result = fetcher.fetch("Knuth84", &ReferenceKind::Unrecognized);

        assert!(matches!(result, Err(FetchError::UnsupportedKind { .. })));
        assert!(fetcher.transport.requests.borrow().is_empty());
    }

    #[test]
    fn fetch_malformed_record() {
        let transport = FakeTransport::default().with("mock://rfc/1234", "<html>not found</html>");
        let fetcher = RecordFetcher::new(settings(), transport);
        let result = fetcher.fetch("rfc1234", &classify("rfc1234"));

        assert!(matches!(result, Err(FetchError::MalformedRecord { .. })));
    }

    #[test]
    fn fetch_invalid_utf8() {
        let transport = FakeTransport::default().with("mock://rfc/1234", vec![b'@', 0xff, 0xfe]);
        let fetcher = RecordFetcher::new(settings(), transport);
        let result = fetcher.fetch("rfc1234", &classify("rfc1234"));

        assert!(matches!(result, Err(FetchError::Encoding { .. })));
    }

    #[test]
    fn fetch_unreachable_registry() {
        let fetcher = RecordFetcher::new(settings(), FakeTransport::default());
        let result = fetcher.fetch("rfc1234", &classify("rfc1234"));

        assert!(matches!(result, Err(FetchError::Network { .. })));
    }

    #[test]
    fn canonical_key_requires_declaration() {
        assert_eq!(canonical_key("@misc{RFC8200,\n}"), Some("RFC8200"));
        assert_eq!(canonical_key("@misc{,\n}"), None);
        assert_eq!(canonical_key("title = {foo}"), None);
    }

    #[test]
    fn http_transport_fetches_record() -> anyhow::Result<()> {
        let (addr, server) = serve_once("200 OK", "@misc{rfc8200,\n  title = {{IPv6}},\n}\n")?;
        let transport = HttpTransport::new(Duration::from_secs(5))?;
        let fetcher = RecordFetcher::new(local_settings(addr), transport);
        let result = fetcher.fetch("RFC8200", &classify("RFC8200"))?;

        assert_eq!(
            server.join().expect("server thread"),
            "GET /doc/rfc8200/bibtex/ HTTP/1.1"
        );
        assert_eq!(result.canonical_key, "rfc8200");
        assert_eq!(result.bibtex_data, "@misc{RFC8200,\n  title = {{IPv6}},\n}\n");

        Ok(())
    }

    #[test]
    fn http_transport_rejects_error_status() -> anyhow::Result<()> {
        let (addr, server) = serve_once("404 Not Found", "no such document")?;
        let transport = HttpTransport::new(Duration::from_secs(5))?;
        let fetcher = RecordFetcher::new(local_settings(addr), transport);
        let result = fetcher.fetch("draft-foo-bar-03", &classify("draft-foo-bar-03"));
        let request = server.join().expect("server thread");

        assert_eq!(request, "GET /doc/draft-foo-bar/bibtex/ HTTP/1.1");
        assert!(matches!(result, Err(FetchError::Network { .. })));

        Ok(())
    }

    #[test]
    fn http_transport_refused_connection() -> anyhow::Result<()> {
        let addr = TcpListener::bind("127.0.0.1:0")?.local_addr()?;
        let transport = HttpTransport::new(Duration::from_secs(5))?;
        let fetcher = RecordFetcher::over_http(local_settings(addr))?;
        let result = transport.get(&format!("http://{addr}/"));

        assert!(matches!(result, Err(FetchError::Network { .. })));
        assert!(matches!(
            fetcher.fetch("rfc1234", &classify("rfc1234")),
            Err(FetchError::Network { .. })
        ));

        Ok(())
    }
}
