//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests with status and Content-Type checks
//! - Writing the fetched document to disk

use crate::config::FetcherConfig;
use reqwest::{header::CONTENT_TYPE, Client};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur while fetching and saving a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Failed to write page: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Returns true for failures below the HTTP layer (DNS, connect, timeout)
    pub fn is_network(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

/// A document that was fetched and written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPage {
    /// Where the document was written
    pub path: PathBuf,
    /// Number of bytes written
    pub size_bytes: u64,
    /// URL the document was served from after any redirects; `None` when
    /// the source does not report one
    pub final_url: Option<Url>,
}

impl SavedPage {
    /// Size in whole kilobytes (bytes / 1024, rounded down)
    pub fn size_kb(&self) -> i64 {
        (self.size_bytes / 1024) as i64
    }
}

/// Retrieves a URL and stores its document under a directory
///
/// The harvester is generic over this trait so the pipeline can run against
/// the network ([`HttpFetcher`]) or an in-process source.
pub trait PageFetcher: Send + Sync + 'static {
    /// Fetches `url` and writes its document to `directory/filename`,
    /// replacing any existing file
    fn fetch(
        &self,
        url: &str,
        directory: &Path,
        filename: &str,
    ) -> impl Future<Output = Result<SavedPage, FetchError>> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use site_harvest::config::FetcherConfig;
/// use site_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        // Compressed bodies are decoded before they reach the caller
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over HTTP(S) with reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Wraps an already-built client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from configuration and wraps it
    pub fn from_config(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        directory: &Path,
        filename: &str,
    ) -> Result<SavedPage, FetchError> {
        // Redirects are followed by the client
        let response = self.client.get(url).send().await?;
        let final_url = response.url().clone();

        // Only 2xx responses are saved
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // A missing Content-Type is accepted as a document
        if let Some(content_type) = content_type {
            if !is_document_type(&content_type) {
                return Err(FetchError::UnsupportedContentType(content_type));
            }
        }

        // Decoded as text per the response charset
        let body = response.text().await?;
        let mut saved = save_page(directory, filename, &body).await?;
        saved.final_url = Some(final_url);
        Ok(saved)
    }
}

/// Writes a document body to `directory/filename`, truncating any old content
pub async fn save_page(
    directory: &Path,
    filename: &str,
    body: &str,
) -> Result<SavedPage, FetchError> {
    // The name must stay inside the target directory
    if filename.is_empty() || filename.contains('/') {
        return Err(FetchError::InvalidUrl(format!(
            "cannot derive a file name from '{}'",
            filename
        )));
    }

    // Overwrites whatever an earlier run left under the same name
    let path = directory.join(filename);
    tokio::fs::write(&path, body.as_bytes()).await?;

    Ok(SavedPage {
        path,
        size_bytes: body.len() as u64,
        final_url: None,
    })
}

/// Returns true if a Content-Type names something parseable as a document
///
/// Accepts `text/*`, `application/xml`, `application/xhtml+xml` and any
/// other `+xml` type. Parameters such as `charset` are ignored.
pub fn is_document_type(content_type: &str) -> bool {
    // Drop parameters such as charset
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime.starts_with("text/") || mime == "application/xml" || mime.ends_with("+xml")
}
