//! Validation result cache
//!
//! Memoizes classifier output per canonical link for a bounded time. Expiry is
//! lazy: an entry is stale once `now >= expires_at` at lookup time, and no
//! background task evicts anything.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::types::{CanonicalLink, ValidationRecord};

/// Longer TTLs are clamped so `Instant` arithmetic cannot overflow
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    record: ValidationRecord,
    expires_at: Instant,
}

/// Time-bounded cache of validation records keyed by canonical link
#[derive(Debug)]
pub struct ValidationCache {
    entries: RwLock<HashMap<CanonicalLink, CacheEntry>>,
    ttl: Duration,
}

impl ValidationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh record for `link`, if any
    pub fn get(&self, link: &CanonicalLink) -> Option<ValidationRecord> {
        self.get_at(link, Instant::now())
    }

    /// Fresh record for `link` as of `now`
    pub fn get_at(&self, link: &CanonicalLink, now: Instant) -> Option<ValidationRecord> {
        let entries = self.entries.read();
        entries
            .get(link)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.record.clone())
    }

    /// Store or refresh a record with the default TTL
    pub fn put(&self, link: CanonicalLink, record: ValidationRecord) {
        self.put_at(link, record, self.ttl, Instant::now());
    }

    /// Store or refresh a record with an explicit TTL
    pub fn put_with_ttl(&self, link: CanonicalLink, record: ValidationRecord, ttl: Duration) {
        self.put_at(link, record, ttl, Instant::now());
    }

    /// Store or refresh a record inserted at `now`
    pub fn put_at(&self, link: CanonicalLink, record: ValidationRecord, ttl: Duration, now: Instant) {
        let expires_at = now
            .checked_add(ttl.min(MAX_TTL))
            .unwrap_or(now);
        self.entries
            .write()
            .insert(link, CacheEntry { record, expires_at });
    }

    /// Drop stale entries; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    /// Number of entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
