//! Coordinator types: progress, results, and statistics

use std::time::Duration;

use crate::types::ValidationRecord;

/// Progress after one link of a batch completes
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress<'a> {
    /// Links finished so far, including this one
    pub completed: usize,
    /// Links dispatched in this batch
    pub total: usize,
    /// Record just produced
    pub record: &'a ValidationRecord,
}

/// Statistics for one batch
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Links sent to workers
    pub dispatched: usize,
    /// Links dropped because the store already had them
    pub skipped_processed: usize,
    /// Links answered by the validation cache
    pub cache_hits: usize,
    /// Links that went to the network
    pub network_fetches: usize,
    /// Wall time for the whole batch
    pub duration: Duration,
}

/// Records of one batch, in completion order, plus statistics
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub records: Vec<ValidationRecord>,
    pub report: BatchReport,
}
