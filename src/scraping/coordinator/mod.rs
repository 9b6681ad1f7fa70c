//! Validation coordinator running batches through a bounded worker pool
//!
//! Deduplicates a batch, drops links the result store already holds, and
//! validates the rest concurrently under a semaphore. Every dispatched link
//! yields exactly one record, even when its task panics.

mod types;

pub use types::*;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};

use super::store::ResultStore;
use super::validator::{LinkValidator, ValidationOutcome};
use crate::types::{CanonicalLink, LinkStatus, ValidationRecord};

/// Runs validation batches and commits their records to the store
pub struct ValidationCoordinator {
    validator: LinkValidator,
    store: Arc<ResultStore>,
    max_workers: usize,
}

impl ValidationCoordinator {
    pub fn new(validator: LinkValidator, store: Arc<ResultStore>, max_workers: usize) -> Self {
        Self {
            validator,
            store,
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn validator(&self) -> &LinkValidator {
        &self.validator
    }

    /// Validate a batch of links.
    ///
    /// `progress` runs once per completed link, in completion order. Records
    /// are merged into the store before this returns.
    pub async fn validate_batch<I, F>(&self, links: I, mut progress: F) -> BatchOutcome
    where
        I: IntoIterator<Item = CanonicalLink>,
        F: FnMut(&BatchProgress<'_>),
    {
        let start = Instant::now();
        let mut report = BatchReport::default();

        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        for link in links {
            if !seen.insert(link.clone()) {
                continue;
            }
            if self.store.contains(&link) {
                report.skipped_processed += 1;
            } else {
                pending.push(link);
            }
        }

        report.dispatched = pending.len();
        let total = pending.len();
        if total == 0 {
            tracing::debug!(skipped = report.skipped_processed, "Nothing to validate");
            report.duration = start.elapsed();
            return BatchOutcome {
                records: Vec::new(),
                report,
            };
        }

        tracing::info!(
            links = total,
            skipped = report.skipped_processed,
            max_workers = self.max_workers,
            "Validating batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();
        // Task id -> link, so a panicked task still maps to its link
        let mut in_flight: HashMap<Id, CanonicalLink> = HashMap::with_capacity(total);
        for link in pending {
            let semaphore = Arc::clone(&semaphore);
            let validator = self.validator.clone();
            let task_link = link.clone();
            let handle = tasks.spawn(async move {
                // Held until the link is fully validated
                let _permit = semaphore.acquire_owned().await.ok();
                validator.validate(&task_link).await
            });
            in_flight.insert(handle.id(), link);
        }

        let mut records = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next_with_id().await {
            let outcome = match joined {
                Ok((id, outcome)) => {
                    in_flight.remove(&id);
                    outcome
                }
                Err(e) => match in_flight.remove(&e.id()) {
                    Some(link) => {
                        tracing::warn!(link = %link, error = %e, "Validation task failed");
                        ValidationOutcome {
                            record: ValidationRecord::new(link, LinkStatus::ParsingError),
                            from_cache: false,
                        }
                    }
                    None => {
                        tracing::warn!(error = %e, "Validation task failed for an unknown link");
                        continue;
                    }
                },
            };

            if outcome.from_cache {
                report.cache_hits += 1;
            } else {
                report.network_fetches += 1;
            }

            records.push(outcome.record);
            if let Some(record) = records.last() {
                progress(&BatchProgress {
                    completed: records.len(),
                    total,
                    record,
                });
            }
        }

        self.store.merge(records.iter().cloned());
        report.duration = start.elapsed();

        tracing::info!(
            records = records.len(),
            cache_hits = report.cache_hits,
            network_fetches = report.network_fetches,
            elapsed_ms = report.duration.as_millis() as u64,
            "Batch complete"
        );

        BatchOutcome { records, report }
    }
}
