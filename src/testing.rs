//! Test doubles: an in-memory transport with canned responses and call
//! counting, plus invitation page fixtures.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

use crate::scraping::fetcher::{FetchError, FetchResult, PageTransport};
use crate::scraping::headers::HeaderSet;

/// Canned outcome for one URL
#[derive(Debug, Clone)]
pub enum StubResponse {
    Page {
        final_url: String,
        status: u16,
        body: String,
    },
    Timeout,
    ConnectionRefused,
    /// The request panics instead of answering
    Panic,
}

impl StubResponse {
    /// 200 response served from `final_url`
    pub fn html(final_url: &str, body: impl Into<String>) -> Self {
        Self::status(final_url, 200, body)
    }

    pub fn status(final_url: &str, status: u16, body: impl Into<String>) -> Self {
        Self::Page {
            final_url: final_url.to_string(),
            status,
            body: body.into(),
        }
    }
}

/// Transport serving canned responses keyed by exact request URL.
///
/// Unknown URLs fail with a connection error.
#[derive(Default)]
pub struct StubTransport {
    responses: Mutex<HashMap<String, StubResponse>>,
    calls: Mutex<HashMap<String, usize>>,
    last_headers: Mutex<HeaderSet>,
    total_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request sleeps for `delay` before answering
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn insert(&self, url: &str, response: StubResponse) {
        self.responses.lock().insert(url.to_string(), response);
    }

    /// Requests issued for `url`
    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous requests observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_headers(&self) -> HeaderSet {
        self.last_headers.lock().clone()
    }

    fn respond(&self, url: &Url, timeout: Duration) -> Result<FetchResult, FetchError> {
        let response = self.responses.lock().get(url.as_str()).cloned();
        match response {
            Some(StubResponse::Page {
                final_url,
                status,
                body,
            }) => Ok(FetchResult {
                final_url: Url::parse(&final_url)
                    .map_err(|e| FetchError::InvalidUrl(e.to_string()))?,
                status_code: status,
                body,
                fetch_duration: self.delay,
            }),
            Some(StubResponse::Timeout) => Err(FetchError::Timeout(timeout)),
            Some(StubResponse::ConnectionRefused) => {
                Err(FetchError::Connect("connection refused".to_string()))
            }
            Some(StubResponse::Panic) => panic!("stub transport panicked for {}", url),
            None => Err(FetchError::Connect(format!("no stub for {}", url))),
        }
    }
}

#[async_trait]
impl PageTransport for StubTransport {
    async fn get(
        &self,
        url: &Url,
        headers: &HeaderSet,
        timeout: Duration,
    ) -> Result<FetchResult, FetchError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().entry(url.as_str().to_string()).or_insert(0) += 1;
        *self.last_headers.lock() = headers.clone();

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = self.respond(url, timeout);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Invitation page markup with optional preview tags and extra body text
pub fn invite_page(title: Option<&str>, image: Option<&str>, body_text: &str) -> String {
    let mut head = String::new();
    if let Some(title) = title {
        head.push_str(&format!(r#"<meta property="og:title" content="{}">"#, title));
    }
    if let Some(image) = image {
        head.push_str(&format!(r#"<meta property="og:image" content="{}">"#, image));
    }
    format!(
        "<html><head>{}</head><body><div class=\"card\"><p>{}</p></div></body></html>",
        head, body_text
    )
}

/// Invite code of the given index, long enough to normalize
pub fn invite_code(index: usize) -> String {
    format!("TESTCODE{:012}", index)
}

/// Canonical invitation URL for the given index
pub fn invite_url(index: usize) -> String {
    format!("https://chat.whatsapp.com/{}", invite_code(index))
}
