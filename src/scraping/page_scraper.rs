//! Invitation link discovery on arbitrary web pages
//!
//! Candidates come from two sources on each page: anchor targets, and a
//! pattern scan of the raw body for links that only appear as text. Both pass
//! through the normalizer, so only canonical links leave this module.

use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use super::fetcher::{extract_urls, FetchEngine, FetchResult};
use super::normalize::LinkNormalizer;
use crate::types::CanonicalLink;

/// Outcome of scanning several pages
#[derive(Debug, Clone, Default)]
pub struct ScrapeReport {
    /// Union of links found on every page
    pub links: BTreeSet<CanonicalLink>,
    /// Pages attempted
    pub pages_scanned: usize,
    /// Pages whose fetch failed
    pub failed_pages: Vec<String>,
}

/// Progress after one page of a multi-page scan
#[derive(Debug, Clone, Copy)]
pub struct ScrapeProgress<'a> {
    pub completed: usize,
    pub total: usize,
    pub page_url: &'a str,
    /// Links found on this page
    pub found: usize,
}

/// Scans pages for invitation links
pub struct PageScraper {
    fetcher: Arc<FetchEngine>,
    normalizer: LinkNormalizer,
    /// Body text scan; `None` when the pattern could not be built
    text_pattern: Option<Regex>,
}

impl PageScraper {
    pub fn new(fetcher: Arc<FetchEngine>, normalizer: LinkNormalizer) -> Self {
        let text_pattern = Self::build_pattern(&normalizer);
        Self {
            fetcher,
            normalizer,
            text_pattern,
        }
    }

    fn build_pattern(normalizer: &LinkNormalizer) -> Option<Regex> {
        let pattern = format!(
            r"(?i)https?://{}/(?:invite/)?[A-Za-z0-9_-]{{{},}}",
            regex::escape(normalizer.host()),
            normalizer.min_code_length().max(1)
        );
        match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(error = %e, "Invalid link pattern, text scan disabled");
                None
            }
        }
    }

    pub fn normalizer(&self) -> &LinkNormalizer {
        &self.normalizer
    }

    /// Links on one page. Failures yield an empty set.
    pub async fn scrape_links(&self, page_url: &str) -> HashSet<CanonicalLink> {
        match self.fetcher.fetch_page(page_url).await {
            Ok(page) => self.extract_links(&page),
            Err(e) => {
                tracing::warn!(page = %page_url, error = %e, "Failed to scrape page");
                HashSet::new()
            }
        }
    }

    /// Canonical links in a fetched page, from anchors and body text
    pub fn extract_links(&self, page: &FetchResult) -> HashSet<CanonicalLink> {
        let mut links: HashSet<CanonicalLink> = extract_urls(page)
            .iter()
            .filter_map(|url| self.normalizer.normalize(url.as_str()))
            .collect();

        if let Some(pattern) = &self.text_pattern {
            links.extend(
                pattern
                    .find_iter(&page.body)
                    .filter_map(|m| self.normalizer.normalize(m.as_str())),
            );
        }

        tracing::debug!(page = %page.final_url, links = links.len(), "Extracted invitation links");
        links
    }

    /// Scan pages one after another and merge their links
    pub async fn scrape_pages<I, S, F>(&self, page_urls: I, mut progress: F) -> ScrapeReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&ScrapeProgress<'_>),
    {
        let pages: Vec<String> = page_urls
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let total = pages.len();
        let mut report = ScrapeReport::default();

        for page_url in &pages {
            let page_url = page_url.as_str();
            report.pages_scanned += 1;

            let found = match self.fetcher.fetch_page(page_url).await {
                Ok(result) => {
                    let links = self.extract_links(&result);
                    let count = links.len();
                    report.links.extend(links);
                    count
                }
                Err(e) => {
                    tracing::warn!(page = %page_url, error = %e, "Failed to scrape page");
                    report.failed_pages.push(page_url.to_string());
                    0
                }
            };

            progress(&ScrapeProgress {
                completed: report.pages_scanned,
                total,
                page_url,
                found,
            });
        }

        tracing::info!(
            pages = report.pages_scanned,
            failed = report.failed_pages.len(),
            links = report.links.len(),
            "Page scan complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::fetcher::FetchConfig;
    use crate::scraping::headers::FixedHeaders;
    use crate::testing::{invite_code, invite_url, StubResponse, StubTransport};
    use std::time::Duration;
    use url::Url;

    fn scraper(transport: Arc<StubTransport>) -> PageScraper {
        let fetcher = FetchEngine::with_transport(
            FetchConfig::default(),
            transport,
            Arc::new(FixedHeaders::default()),
        );
        PageScraper::new(Arc::new(fetcher), LinkNormalizer::default())
    }

    fn page(body: &str) -> FetchResult {
        FetchResult {
            final_url: Url::parse("https://forum.example.com/thread/1").unwrap(),
            status_code: 200,
            body: body.to_string(),
            fetch_duration: Duration::from_millis(1),
        }
    }

    fn link(index: usize) -> CanonicalLink {
        LinkNormalizer::default().normalize(&invite_url(index)).unwrap()
    }

    #[test]
    fn test_anchor_and_text_links() {
        let scraper = scraper(Arc::new(StubTransport::new()));
        let body = format!(
            r#"<a href="{}?utm_source=x">one</a>
               <a href="https://chat.whatsapp.com/invite/{}">two</a>
               <p>Or paste https://chat.whatsapp.com/{} into your browser</p>
               <a href="https://chat.whatsapp.com/short">too short</a>
               <a href="https://example.com/{}">other site</a>"#,
            invite_url(1),
            invite_code(2),
            invite_code(3),
            invite_code(4),
        );

        let links = scraper.extract_links(&page(&body));
        let expected: HashSet<_> = [link(1), link(2), link(3)].into_iter().collect();
        assert_eq!(links, expected);
    }

    #[test]
    fn test_duplicates_collapse() {
        let scraper = scraper(Arc::new(StubTransport::new()));
        let body = format!(
            r#"<a href="{0}">a</a><a href="{0}/">b</a> {0}"#,
            invite_url(7)
        );
        assert_eq!(scraper.extract_links(&page(&body)).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_page_yields_empty_set() {
        let scraper = scraper(Arc::new(StubTransport::new()));
        assert!(scraper.scrape_links("https://down.example.com/").await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_page_does_not_drop_others() {
        let transport = Arc::new(StubTransport::new());
        transport.insert(
            "https://a.example.com/",
            StubResponse::html("https://a.example.com/", format!(r#"<a href="{}">join</a>"#, invite_url(1))),
        );
        transport.insert("https://b.example.com/", StubResponse::Timeout);
        transport.insert(
            "https://c.example.com/",
            StubResponse::html("https://c.example.com/", format!("text {}", invite_url(2))),
        );
        let scraper = scraper(transport);

        let mut pages_seen = Vec::new();
        let report = scraper
            .scrape_pages(
                ["https://a.example.com/", "https://b.example.com/", " ", "https://c.example.com/"],
                |p| pages_seen.push((p.completed, p.total, p.found)),
            )
            .await;

        assert_eq!(report.pages_scanned, 3);
        assert_eq!(report.failed_pages, vec!["https://b.example.com/".to_string()]);
        let expected: BTreeSet<_> = [link(1), link(2)].into_iter().collect();
        assert_eq!(report.links, expected);
        assert_eq!(pages_seen, vec![(1, 3, 1), (2, 3, 0), (3, 3, 1)]);
    }
}
