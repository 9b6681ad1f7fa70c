//! Single-link validation: cache lookup, fetch, classification

use std::sync::Arc;

use super::{
    cache::ValidationCache,
    classifier::InviteClassifier,
    fetcher::FetchEngine,
};
use crate::types::{CanonicalLink, LinkStatus, ValidationRecord};

/// Record produced for one link, and whether the cache answered
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub record: ValidationRecord,
    pub from_cache: bool,
}

/// Validates invitation links against the network, memoized by the cache
#[derive(Clone)]
pub struct LinkValidator {
    fetcher: Arc<FetchEngine>,
    classifier: Arc<InviteClassifier>,
    cache: Arc<ValidationCache>,
}

impl LinkValidator {
    pub fn new(
        fetcher: Arc<FetchEngine>,
        classifier: Arc<InviteClassifier>,
        cache: Arc<ValidationCache>,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<ValidationCache> {
        &self.cache
    }

    pub fn fetcher(&self) -> &Arc<FetchEngine> {
        &self.fetcher
    }

    /// Validate one link. Never fails: every failure mode is a status.
    pub async fn validate(&self, link: &CanonicalLink) -> ValidationOutcome {
        if let Some(record) = self.cache.get(link) {
            tracing::trace!(link = %link, "Cache hit");
            return ValidationOutcome {
                record,
                from_cache: true,
            };
        }

        let record = match self.fetcher.fetch_invite(link).await {
            Ok(page) => {
                // HTML parsing is CPU-bound; keep it off the async workers
                let classifier = Arc::clone(&self.classifier);
                let task_link = link.clone();
                let classified =
                    tokio::task::spawn_blocking(move || classifier.classify(&task_link, &page)).await;

                match classified {
                    Ok(record) => record,
                    Err(e) => {
                        tracing::warn!(link = %link, error = %e, "Classification task failed");
                        ValidationRecord::new(link.clone(), LinkStatus::ParsingError)
                    }
                }
            }
            Err(e) => {
                tracing::debug!(link = %link, error = %e, "Invite fetch failed");
                ValidationRecord::new(link.clone(), LinkStatus::NetworkError(e.kind()))
            }
        };

        self.cache.put(link.clone(), record.clone());
        ValidationOutcome {
            record,
            from_cache: false,
        }
    }
}
