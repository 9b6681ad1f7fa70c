//! Harvesting session
//!
//! Owns the validation cache and the result store for the lifetime of one
//! user session, together with the components that read and write them.
//! Both are emptied only by [`Session::reset`].

use std::sync::Arc;

use crate::config::ValidationConfig;
use crate::scraping::{
    BatchOutcome, BatchProgress, FetchEngine, FetchError, HeaderProvider, InviteClassifier,
    LinkNormalizer, LinkValidator, PageScraper, PageTransport, RandomHeaders, ResultStore,
    ScrapeProgress, ScrapeReport, ValidationCache, ValidationCoordinator,
};
use crate::scraping::fetcher::FetchConfig;
use crate::types::CanonicalLink;

/// Normalizer, fetcher, cache, store, and worker pool sharing one configuration
pub struct Session {
    config: ValidationConfig,
    normalizer: LinkNormalizer,
    fetcher: Arc<FetchEngine>,
    cache: Arc<ValidationCache>,
    store: Arc<ResultStore>,
    coordinator: ValidationCoordinator,
    scraper: PageScraper,
}

impl Session {
    /// Session over the HTTP transport with randomized headers
    pub fn new(config: &ValidationConfig) -> Result<Self, FetchError> {
        let headers: Arc<dyn HeaderProvider> = Arc::new(RandomHeaders::from_config(config));
        let fetcher = FetchEngine::new(FetchConfig::from_config(config), headers)?;
        Ok(Self::build(config, fetcher))
    }

    /// Session over an arbitrary transport and header provider
    pub fn with_transport(
        config: &ValidationConfig,
        transport: Arc<dyn PageTransport>,
        headers: Arc<dyn HeaderProvider>,
    ) -> Self {
        let fetcher = FetchEngine::with_transport(FetchConfig::from_config(config), transport, headers);
        Self::build(config, fetcher)
    }

    fn build(config: &ValidationConfig, fetcher: FetchEngine) -> Self {
        let normalizer = LinkNormalizer::from_config(config);
        let fetcher = Arc::new(fetcher);
        let cache = Arc::new(ValidationCache::new(config.cache_ttl()));
        let store = Arc::new(ResultStore::new());

        let validator = LinkValidator::new(
            Arc::clone(&fetcher),
            Arc::new(InviteClassifier::from_config(config)),
            Arc::clone(&cache),
        );
        let coordinator = ValidationCoordinator::new(validator, Arc::clone(&store), config.max_workers);
        let scraper = PageScraper::new(Arc::clone(&fetcher), normalizer.clone());

        Self {
            config: config.clone(),
            normalizer,
            fetcher,
            cache,
            store,
            coordinator,
            scraper,
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &LinkNormalizer {
        &self.normalizer
    }

    pub fn fetcher(&self) -> &Arc<FetchEngine> {
        &self.fetcher
    }

    pub fn cache(&self) -> &Arc<ValidationCache> {
        &self.cache
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    pub fn scraper(&self) -> &PageScraper {
        &self.scraper
    }

    /// Validate canonical links; records land in the store
    pub async fn validate_batch<I, F>(&self, links: I, progress: F) -> BatchOutcome
    where
        I: IntoIterator<Item = CanonicalLink>,
        F: FnMut(&BatchProgress<'_>),
    {
        self.coordinator.validate_batch(links, progress).await
    }

    /// Normalize raw strings, then validate what survives.
    ///
    /// Returns the batch outcome and the number of rejected inputs.
    pub async fn validate_raw<I, S, F>(&self, raw: I, progress: F) -> (BatchOutcome, usize)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&BatchProgress<'_>),
    {
        let batch = self.normalizer.normalize_all(raw);
        if batch.rejected > 0 {
            tracing::info!(rejected = batch.rejected, "Skipped inputs that are not invitation links");
        }
        let outcome = self.validate_batch(batch.links, progress).await;
        (outcome, batch.rejected)
    }

    /// Scan pages for links without validating them
    pub async fn scrape_pages<I, S, F>(&self, page_urls: I, progress: F) -> ScrapeReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&ScrapeProgress<'_>),
    {
        self.scraper.scrape_pages(page_urls, progress).await
    }

    /// Drop all records and cached validations
    pub fn reset(&self) {
        let records = self.store.len();
        let cached = self.cache.len();
        self.store.clear();
        self.cache.clear();
        tracing::info!(records, cached, "Session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::FixedHeaders;
    use crate::testing::{invite_page, invite_url, StubResponse, StubTransport};
    use crate::types::LinkStatus;

    fn session(transport: Arc<StubTransport>) -> Session {
        Session::with_transport(
            &ValidationConfig::default(),
            transport,
            Arc::new(FixedHeaders::default()),
        )
    }

    #[tokio::test]
    async fn test_validate_raw_counts_rejections() {
        let transport = Arc::new(StubTransport::new());
        transport.insert(
            &invite_url(1),
            StubResponse::html(&invite_url(1), invite_page(Some("Runners"), None, "")),
        );
        let session = session(transport);

        let raw = vec![
            format!("  {}?lang=en  ", invite_url(1)),
            invite_url(1),
            "https://example.com/not-an-invite".to_string(),
            "".to_string(),
        ];
        let (outcome, rejected) = session.validate_raw(raw, |_| {}).await;

        assert_eq!(rejected, 1);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].status, LinkStatus::Active);
        assert_eq!(session.store().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_clears_store_and_cache() {
        let transport = Arc::new(StubTransport::new());
        transport.insert(
            &invite_url(1),
            StubResponse::html(&invite_url(1), invite_page(Some("Runners"), None, "")),
        );
        let session = session(Arc::clone(&transport));

        session.validate_raw([invite_url(1)], |_| {}).await;
        assert_eq!(session.cache().len(), 1);

        session.reset();
        assert!(session.store().is_empty());
        assert!(session.cache().is_empty());

        // Revalidation goes back to the network
        session.validate_raw([invite_url(1)], |_| {}).await;
        assert_eq!(transport.total_calls(), 2);
    }
}
