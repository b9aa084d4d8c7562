//! HTTP fetching for archives and digest sidecars.
//!
//! Provides a trait-based abstraction over the transport so the pipeline can
//! be exercised against in-memory bodies in tests.

use super::progress::ProgressReader;
use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

/// Connect timeout for archive and digest downloads.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on the size of a digest sidecar body.
const MAX_SIDECAR_BYTES: u64 = 4096;

/// An open response whose body has not been consumed yet.
pub struct FetchResponse {
    /// Size reported by the transport, if any.
    pub content_length: Option<u64>,
    /// The response body as a byte stream.
    pub body: Box<dyn Read>,
}

impl FetchResponse {
    /// Build a response over an in-memory body.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            content_length: Some(bytes.len() as u64),
            body: Box::new(std::io::Cursor::new(bytes)),
        }
    }
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Trait for issuing GET requests.
///
/// # Examples
///
/// ```no_run
/// use openssl_acquire::artefact::download::{HttpClient, UreqClient};
///
/// let response = UreqClient.get("https://www.openssl.org/source/openssl-3.0.15.tar.gz")?;
/// println!("{:?} bytes advertised", response.content_length);
/// # Ok::<(), openssl_acquire::artefact::download::DownloadError>(())
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient {
    /// Issue a GET request and return the response with its body unread.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with an
    /// error status.
    fn get(&self, url: &str) -> Result<FetchResponse, DownloadError>;
}

/// Errors arising from HTTP operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested resource was not found (HTTP 404).
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error reading the response body.
    #[error("I/O error reading {url}: {source}")]
    Io {
        /// The URL whose body failed to read.
        url: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// HTTP client backed by a shared `ureq` agent.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqClient;

impl HttpClient for UreqClient {
    fn get(&self, url: &str) -> Result<FetchResponse, DownloadError> {
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let body = response.into_body();
        let content_length = body.content_length();
        Ok(FetchResponse {
            content_length,
            body: Box::new(body.into_reader()),
        })
    }
}

/// Open `url` as a progress-reporting byte stream.
///
/// # Errors
///
/// Propagates the transport error from `client`.
pub fn open_stream(
    client: &dyn HttpClient,
    url: &str,
) -> Result<ProgressReader<Box<dyn Read>>, DownloadError> {
    let response = client.get(url)?;
    let total = response.content_length.unwrap_or(0);
    Ok(ProgressReader::new(response.body, url_filename(url), total))
}

/// Fetch a small text resource such as a digest sidecar.
///
/// # Errors
///
/// Returns an error if the request fails or the body is not readable text.
pub fn fetch_text(client: &dyn HttpClient, url: &str) -> Result<String, DownloadError> {
    let response = client.get(url)?;
    let mut text = String::new();
    response
        .body
        .take(MAX_SIDECAR_BYTES)
        .read_to_string(&mut text)
        .map_err(|source| DownloadError::Io {
            url: url.to_owned(),
            source,
        })?;
    Ok(text)
}

/// The last path segment of a URL, used as a progress label.
#[must_use]
pub fn url_filename(url: &str) -> &str {
    url.rsplit('/').find(|segment| !segment.is_empty()).unwrap_or(url)
}

fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
