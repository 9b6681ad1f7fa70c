//! Fetch engine for invitation pages and link-bearing pages
//!
//! A single HTTP GET per call with provider-supplied headers, a per-request
//! timeout, and limited redirect following. Network-level failures (timeout,
//! connection, non-2xx status) come back as [`FetchError`] and are never
//! retried here.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

use super::headers::{HeaderProvider, HeaderSet};
use crate::config::ValidationConfig;
use crate::types::{CanonicalLink, NetworkErrorKind};

/// Errors that can occur during fetching
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Unexpected HTTP status {0}")]
    Status(u16),
    #[error("Content too large: {0} bytes")]
    ContentTooLarge(usize),
    #[error("Failed to parse URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Failure category recorded on a validation record
    pub fn kind(&self) -> NetworkErrorKind {
        match self {
            Self::Timeout(_) => NetworkErrorKind::Timeout,
            Self::Connect(_) => NetworkErrorKind::Connection,
            Self::Status(code) => NetworkErrorKind::HttpStatus(*code),
            Self::Http(e) if e.is_timeout() => NetworkErrorKind::Timeout,
            Self::Http(e) if e.is_connect() => NetworkErrorKind::Connection,
            Self::Http(e) => e
                .status()
                .map(|s| NetworkErrorKind::HttpStatus(s.as_u16()))
                .unwrap_or(NetworkErrorKind::Other),
            Self::ContentTooLarge(_) | Self::InvalidUrl(_) => NetworkErrorKind::Other,
        }
    }

    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

/// Result of a completed request
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Response body
    pub body: String,
    /// Time taken to fetch
    pub fetch_duration: Duration,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Configuration for the fetch engine
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Timeout for invitation pages
    pub request_timeout: Duration,
    /// Timeout for pages scanned for links
    pub scrape_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Maximum response size (bytes)
    pub max_content_size: usize,
}

impl FetchConfig {
    pub fn from_config(config: &ValidationConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            scrape_timeout: config.scrape_timeout(),
            connect_timeout: config.connect_timeout(),
            max_redirects: config.max_redirects,
            max_content_size: config.max_content_size,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from_config(&ValidationConfig::default())
    }
}

/// One GET request over some transport
#[async_trait]
pub trait PageTransport: Send + Sync {
    /// Perform a GET following redirects. Non-2xx responses are returned as
    /// results; only transport failures are errors.
    async fn get(
        &self,
        url: &Url,
        headers: &HeaderSet,
        timeout: Duration,
    ) -> Result<FetchResult, FetchError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
    max_content_size: usize,
}

impl HttpTransport {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            max_content_size: config.max_content_size,
        })
    }
}

#[async_trait]
impl PageTransport for HttpTransport {
    async fn get(
        &self,
        url: &Url,
        headers: &HeaderSet,
        timeout: Duration,
    ) -> Result<FetchResult, FetchError> {
        let start = Instant::now();

        let mut request = self.client.get(url.as_str()).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, timeout))?;

        let status = response.status();
        let final_url = response.url().clone();

        if let Some(len) = response.content_length() {
            if len as usize > self.max_content_size {
                return Err(FetchError::ContentTooLarge(len as usize));
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, timeout))?;

        if body.len() > self.max_content_size {
            return Err(FetchError::ContentTooLarge(body.len()));
        }

        Ok(FetchResult {
            final_url,
            status_code: status.as_u16(),
            body,
            fetch_duration: start.elapsed(),
        })
    }
}

/// Fetch statistics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Total fetch attempts
    pub total_fetches: u64,
    /// 2xx responses
    pub successes: u64,
    /// Transport failures and non-2xx responses
    pub failures: u64,
}

#[derive(Debug, Default)]
struct FetchCounters {
    total: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

/// Fetch engine shared by the validator and the page scraper.
///
/// Lock-free: statistics use atomics so one engine can serve every worker.
pub struct FetchEngine {
    transport: Arc<dyn PageTransport>,
    headers: Arc<dyn HeaderProvider>,
    config: FetchConfig,
    counters: FetchCounters,
}

impl FetchEngine {
    /// Create an engine over the reqwest transport
    pub fn new(config: FetchConfig, headers: Arc<dyn HeaderProvider>) -> Result<Self, FetchError> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::with_transport(config, transport, headers))
    }

    /// Create an engine over an arbitrary transport
    pub fn with_transport(
        config: FetchConfig,
        transport: Arc<dyn PageTransport>,
        headers: Arc<dyn HeaderProvider>,
    ) -> Self {
        Self {
            transport,
            headers,
            config,
            counters: FetchCounters::default(),
        }
    }

    /// Fetch a URL, treating non-2xx statuses as failures
    pub async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchResult, FetchError> {
        self.counters.total.fetch_add(1, Ordering::Relaxed);

        let headers = self.headers.headers();
        let result = match self.transport.get(url, &headers, timeout).await {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => Err(FetchError::Status(response.status_code)),
            Err(e) => Err(e),
        };

        match &result {
            Ok(response) => {
                self.counters.successes.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(
                    url = %url,
                    final_url = %response.final_url,
                    elapsed_ms = response.fetch_duration.as_millis() as u64,
                    "Fetched"
                );
            }
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(url = %url, error = %e, "Fetch failed");
            }
        }

        result
    }

    /// Fetch an invitation page with the request timeout
    pub async fn fetch_invite(&self, link: &CanonicalLink) -> Result<FetchResult, FetchError> {
        let url = Url::parse(link.as_str()).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        self.fetch(&url, self.config.request_timeout).await
    }

    /// Fetch a page to be scanned for links, with the scrape timeout.
    ///
    /// Bare host names get an `https://` scheme.
    pub async fn fetch_page(&self, page_url: &str) -> Result<FetchResult, FetchError> {
        let page_url = page_url.trim();
        let url = Url::parse(page_url)
            .or_else(|_| Url::parse(&format!("https://{}", page_url)))
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", page_url, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(FetchError::InvalidUrl(format!(
                "only http/https pages can be scanned, got {}",
                url.scheme()
            )));
        }

        self.fetch(&url, self.config.scrape_timeout).await
    }

    /// Get fetch statistics
    pub fn stats(&self) -> FetchStats {
        FetchStats {
            total_fetches: self.counters.total.load(Ordering::Relaxed),
            successes: self.counters.successes.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

/// Extract anchor targets from a fetched page, resolved against its final URL
pub fn extract_urls(result: &FetchResult) -> Vec<Url> {
    use scraper::{Html, Selector};
    use std::collections::HashSet;

    let base_url = &result.final_url;
    let document = Html::parse_document(&result.body);

    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            if let Ok(url) = base_url.join(href.trim()) {
                if (url.scheme() == "http" || url.scheme() == "https")
                    && seen.insert(url.as_str().to_string())
                {
                    urls.push(url);
                }
            }
        }
    }

    urls
}
