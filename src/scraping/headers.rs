//! Request header providers
//!
//! Randomizing the user agent per request lowers the chance of bulk blocking.
//! Providers are pluggable so tests can pin a fixed header set.

use rand::seq::SliceRandom;

use crate::config::ValidationConfig;

/// Ordered list of header name/value pairs
pub type HeaderSet = Vec<(String, String)>;

/// User agent sent when no randomization source is available
pub const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Source of headers for each outbound request
pub trait HeaderProvider: Send + Sync {
    fn headers(&self) -> HeaderSet;
}

/// Always returns the same headers
#[derive(Debug, Clone)]
pub struct FixedHeaders {
    headers: HeaderSet,
}

impl FixedHeaders {
    pub fn new(headers: HeaderSet) -> Self {
        Self { headers }
    }
}

impl Default for FixedHeaders {
    fn default() -> Self {
        Self::new(vec![("User-Agent".to_string(), FALLBACK_USER_AGENT.to_string())])
    }
}

impl HeaderProvider for FixedHeaders {
    fn headers(&self) -> HeaderSet {
        self.headers.clone()
    }
}

/// Picks a random user agent from a pool for every request
#[derive(Debug, Clone)]
pub struct RandomHeaders {
    user_agents: Vec<String>,
    accept_language: String,
    fallback: FixedHeaders,
}

impl RandomHeaders {
    pub fn new(user_agents: Vec<String>, accept_language: impl Into<String>) -> Self {
        let user_agents: Vec<String> = user_agents
            .into_iter()
            .filter(|ua| !ua.trim().is_empty())
            .collect();
        if user_agents.is_empty() {
            tracing::warn!("No user agents configured, using a fixed fallback header set");
        }
        Self {
            user_agents,
            accept_language: accept_language.into(),
            fallback: FixedHeaders::default(),
        }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.user_agents.clone(), config.accept_language.clone())
    }
}

impl HeaderProvider for RandomHeaders {
    fn headers(&self) -> HeaderSet {
        let Some(user_agent) = self.user_agents.choose(&mut rand::thread_rng()) else {
            return self.fallback.headers();
        };

        let mut headers = vec![("User-Agent".to_string(), user_agent.clone())];
        if !self.accept_language.is_empty() {
            headers.push(("Accept-Language".to_string(), self.accept_language.clone()));
        }
        headers
    }
}
