//! Link normalization, fetching, classification, and caching configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Invitation host whose links are harvested
pub const DEFAULT_INVITE_HOST: &str = "chat.whatsapp.com";

/// Shortest invite code accepted; shorter path fragments are noise
pub const DEFAULT_MIN_CODE_LENGTH: usize = 16;

/// Phrases shown by the invitation page once a link is dead or the group is full
pub const DEFAULT_EXPIRY_PHRASES: &[&str] = &[
    "invite link was reset",
    "group doesn't exist",
    "group doesn\u{2019}t exist",
    "group does not exist",
    "link is no longer active",
    "group is full",
];

/// Browser user agents rotated across requests
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

/// Validation pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Host every canonical link must point at
    pub invite_host: String,
    /// Minimum invite code length
    pub min_code_length: usize,
    /// Maximum simultaneous in-flight validations
    pub max_workers: usize,
    /// Timeout for fetching an invitation page (seconds)
    pub request_timeout_secs: u64,
    /// Timeout for fetching a page scanned for links (seconds)
    pub scrape_timeout_secs: u64,
    /// TCP connect timeout (seconds)
    pub connect_timeout_secs: u64,
    /// Maximum redirects followed per request
    pub max_redirects: usize,
    /// Maximum accepted response body (bytes)
    pub max_content_size: usize,
    /// How long a validation result stays fresh (seconds)
    pub cache_ttl_secs: u64,
    /// Case-insensitive phrases marking an expired or full invite
    pub expiry_phrases: Vec<String>,
    /// User agents to pick from per request; empty means one fixed header set
    pub user_agents: Vec<String>,
    /// Accept-Language header sent with randomized headers
    pub accept_language: String,
}

impl ValidationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            invite_host: DEFAULT_INVITE_HOST.to_string(),
            min_code_length: DEFAULT_MIN_CODE_LENGTH,
            max_workers: 10,
            request_timeout_secs: 15,
            scrape_timeout_secs: 10,
            connect_timeout_secs: 10,
            max_redirects: 10,
            max_content_size: 10 * 1024 * 1024, // 10 MB
            cache_ttl_secs: 3600,
            expiry_phrases: DEFAULT_EXPIRY_PHRASES.iter().map(|p| p.to_string()).collect(),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}
