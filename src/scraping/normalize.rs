//! Invitation link normalization
//!
//! Turns arbitrary strings (anchor targets, pasted lines, regex matches) into
//! [`CanonicalLink`] keys of the form `https://host/code`, or rejects them.

use std::collections::BTreeSet;
use url::Url;

use crate::config::{ValidationConfig, DEFAULT_INVITE_HOST, DEFAULT_MIN_CODE_LENGTH};
use crate::types::CanonicalLink;

/// Optional path prefix some invitation links carry
const INVITE_PREFIX: &str = "invite/";

/// Links produced from a batch of raw strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    /// Distinct canonical links, ordered
    pub links: BTreeSet<CanonicalLink>,
    /// Raw inputs that did not resolve to a link
    pub rejected: usize,
}

/// Pure normalizer for one invitation host
#[derive(Debug, Clone)]
pub struct LinkNormalizer {
    host: String,
    min_code_length: usize,
}

impl LinkNormalizer {
    pub fn new(host: impl Into<String>, min_code_length: usize) -> Self {
        Self {
            host: host.into().to_ascii_lowercase(),
            min_code_length: min_code_length.max(1),
        }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.invite_host.clone(), config.min_code_length)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn min_code_length(&self) -> usize {
        self.min_code_length
    }

    /// Whether `host` is the invitation host
    pub fn is_invite_host(&self, host: &str) -> bool {
        host.eq_ignore_ascii_case(&self.host)
    }

    /// Normalize a raw string into a canonical link.
    ///
    /// - Requires an `https` URL on the invitation host
    /// - Strips an optional `/invite/` prefix
    /// - Requires a code of `[A-Za-z0-9_-]` at least `min_code_length` long
    /// - Drops query string, fragment, port, and trailing slashes
    pub fn normalize(&self, raw: &str) -> Option<CanonicalLink> {
        let raw = raw.trim();
        if !raw.to_ascii_lowercase().contains(&self.host) {
            return None;
        }

        let parsed = Url::parse(raw).ok()?;
        if parsed.scheme() != "https" {
            return None;
        }
        if !self.is_invite_host(parsed.host_str()?) {
            return None;
        }

        let path = parsed.path().trim_start_matches('/');
        let path = path.strip_prefix(INVITE_PREFIX).unwrap_or(path);
        let code = path.trim_end_matches('/');

        if !self.is_valid_code(code) {
            return None;
        }

        Some(CanonicalLink::from_normalized(format!(
            "{}://{}/{}",
            parsed.scheme(),
            self.host,
            code
        )))
    }

    /// Normalize many raw strings, dropping duplicates and counting rejects
    pub fn normalize_all<I, S>(&self, raw: I) -> NormalizedBatch
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut batch = NormalizedBatch::default();
        for item in raw {
            let item = item.as_ref();
            if item.trim().is_empty() {
                continue;
            }
            match self.normalize(item) {
                Some(link) => {
                    batch.links.insert(link);
                }
                None => batch.rejected += 1,
            }
        }
        batch
    }

    fn is_valid_code(&self, code: &str) -> bool {
        code.len() >= self.min_code_length
            && code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}

impl Default for LinkNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_INVITE_HOST, DEFAULT_MIN_CODE_LENGTH)
    }
}
