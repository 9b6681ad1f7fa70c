//! Session result store
//!
//! Accumulates validation records across batches, one per canonical link.
//! Merges are last-write-wins per link; snapshots keep first-insertion order.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::types::{CanonicalLink, StatusCategory, ValidationRecord};

/// Outcome of a merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Links seen for the first time
    pub inserted: usize,
    /// Links whose record was replaced
    pub replaced: usize,
}

/// Counts by status category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub total: usize,
    pub active: usize,
    pub expired_or_full: usize,
    pub other: usize,
}

/// Selection over stored records
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Case-insensitive substring the group name must contain
    pub name_keyword: Option<String>,
    /// Allowed categories; empty allows all
    pub categories: HashSet<StatusCategory>,
}

impl RecordFilter {
    pub fn matches(&self, record: &ValidationRecord) -> bool {
        if !self.categories.is_empty() && !self.categories.contains(&record.status.category()) {
            return false;
        }

        match self.name_keyword.as_deref().map(str::trim) {
            Some(keyword) if !keyword.is_empty() => record
                .group_name
                .to_lowercase()
                .contains(&keyword.to_lowercase()),
            _ => true,
        }
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    records: Vec<ValidationRecord>,
    index: HashMap<CanonicalLink, usize>,
}

/// Deduplicated, session-scoped record store
#[derive(Debug, Default)]
pub struct ResultStore {
    inner: RwLock<StoreInner>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge records, replacing any existing record with the same link
    pub fn merge<I>(&self, records: I) -> MergeStats
    where
        I: IntoIterator<Item = ValidationRecord>,
    {
        let mut stats = MergeStats::default();
        let mut inner = self.inner.write();
        let StoreInner { records: stored, index } = &mut *inner;

        for record in records {
            match index.get(&record.link) {
                Some(&pos) => {
                    stored[pos] = record;
                    stats.replaced += 1;
                }
                None => {
                    index.insert(record.link.clone(), stored.len());
                    stored.push(record);
                    stats.inserted += 1;
                }
            }
        }

        stats
    }

    /// Copy of all records in first-insertion order
    pub fn snapshot(&self) -> Vec<ValidationRecord> {
        self.inner.read().records.clone()
    }

    pub fn get(&self, link: &CanonicalLink) -> Option<ValidationRecord> {
        let inner = self.inner.read();
        inner.index.get(link).map(|&pos| inner.records[pos].clone())
    }

    pub fn contains(&self, link: &CanonicalLink) -> bool {
        self.inner.read().index.contains_key(link)
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.records.clear();
        inner.index.clear();
    }

    pub fn summary(&self) -> StoreSummary {
        let inner = self.inner.read();
        let mut summary = StoreSummary {
            total: inner.records.len(),
            ..StoreSummary::default()
        };
        for record in &inner.records {
            match record.status.category() {
                StatusCategory::Active => summary.active += 1,
                StatusCategory::ExpiredOrFull => summary.expired_or_full += 1,
                StatusCategory::Other => summary.other += 1,
            }
        }
        summary
    }

    /// Records matching `filter`, in snapshot order
    pub fn filter(&self, filter: &RecordFilter) -> Vec<ValidationRecord> {
        self.inner
            .read()
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::LinkNormalizer;
    use crate::testing::invite_url;
    use crate::types::{LinkStatus, NetworkErrorKind};

    fn link(index: usize) -> CanonicalLink {
        LinkNormalizer::default().normalize(&invite_url(index)).unwrap()
    }

    fn record(index: usize, status: LinkStatus) -> ValidationRecord {
        ValidationRecord::new(link(index), status)
    }

    #[test]
    fn test_merge_last_write_wins() {
        let store = ResultStore::new();
        store.merge(vec![record(1, LinkStatus::Inactive)]);
        let stats = store.merge(vec![record(1, LinkStatus::Active)]);

        assert_eq!(stats, MergeStats { inserted: 0, replaced: 1 });
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].status, LinkStatus::Active);
    }

    #[test]
    fn test_snapshot_keeps_first_insertion_order() {
        let store = ResultStore::new();
        store.merge(vec![record(3, LinkStatus::Active), record(1, LinkStatus::Active)]);
        store.merge(vec![record(2, LinkStatus::Inactive), record(3, LinkStatus::ExpiredOrFull)]);

        let links: Vec<_> = store.snapshot().into_iter().map(|r| r.link).collect();
        assert_eq!(links, vec![link(3), link(1), link(2)]);
        assert_eq!(store.get(&link(3)).unwrap().status, LinkStatus::ExpiredOrFull);
    }

    #[test]
    fn test_duplicates_within_one_merge() {
        let store = ResultStore::new();
        let stats = store.merge(vec![record(1, LinkStatus::Inactive), record(1, LinkStatus::Active)]);

        assert_eq!(stats, MergeStats { inserted: 1, replaced: 1 });
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&link(1)).unwrap().status, LinkStatus::Active);
    }

    #[test]
    fn test_summary_and_filter() {
        let store = ResultStore::new();
        store.merge(vec![
            record(1, LinkStatus::Active).with_group_name("Python Jobs"),
            record(2, LinkStatus::Active).with_group_name("Gardening"),
            record(3, LinkStatus::ExpiredOrFull),
            record(4, LinkStatus::NetworkError(NetworkErrorKind::Timeout)),
        ]);

        assert_eq!(
            store.summary(),
            StoreSummary { total: 4, active: 2, expired_or_full: 1, other: 1 }
        );

        let by_name = store.filter(&RecordFilter {
            name_keyword: Some("python".to_string()),
            ..RecordFilter::default()
        });
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].link, link(1));

        let by_category = store.filter(&RecordFilter {
            name_keyword: None,
            categories: [StatusCategory::ExpiredOrFull, StatusCategory::Other].into_iter().collect(),
        });
        assert_eq!(by_category.len(), 2);

        assert_eq!(store.filter(&RecordFilter::default()).len(), 4);
    }

    #[test]
    fn test_clear() {
        let store = ResultStore::new();
        store.merge(vec![record(1, LinkStatus::Active)]);
        assert!(store.contains(&link(1)));

        store.clear();
        assert!(store.is_empty());
        assert!(!store.contains(&link(1)));
    }
}
