//! Invitation page classification
//!
//! Decides the status of a fetched invitation page. Precedence:
//! 1. Final URL off the invitation host -> `RedirectedAway`
//! 2. Extract preview title (fallback: first heading) and preview image
//! 3. Expiry/fullness phrase in the visible text -> `ExpiredOrFull`, keeping
//!    the placeholder name and no logo
//! 4. Plausible group name -> `Active`
//! 5. Otherwise -> `Inactive`
//!
//! Extraction failures become `ParsingError` records. Network failures are
//! handled before a page ever reaches the classifier.

mod metadata;
mod text;

pub use metadata::{is_plausible_image_url, is_plausible_name, PageMetadata};

use scraper::{Html, Selector};
use std::collections::HashMap;
use thiserror::Error;

use super::fetcher::FetchResult;
use crate::config::{ValidationConfig, DEFAULT_EXPIRY_PHRASES, DEFAULT_INVITE_HOST};
use crate::types::{CanonicalLink, LinkStatus, ValidationRecord};

/// Meta tags read from invitation pages
const META_NAMES: &[&str] = &["og:title", "og:image"];

/// Elements tried in order when the preview title is missing
const HEADING_SELECTORS: &[&str] = &["h2", "strong"];

/// Errors while extracting fields from a fetched page
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Selector unavailable: {0}")]
    Selector(String),
}

/// What the page says, before a status is decided
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInspection {
    pub metadata: PageMetadata,
    /// An expiry or fullness phrase appears in the visible text
    pub expired: bool,
}

/// Heuristic classifier for invitation pages
pub struct InviteClassifier {
    invite_host: String,
    /// Lowercased expiry/fullness phrases
    expiry_phrases: Vec<String>,
    /// Pre-compiled meta selectors: meta name -> (name selector, property selector)
    pub(crate) meta_selectors: HashMap<&'static str, (Option<Selector>, Option<Selector>)>,
    pub(crate) heading_selectors: Vec<Selector>,
}

impl InviteClassifier {
    pub fn new(invite_host: impl Into<String>, expiry_phrases: Vec<String>) -> Self {
        let mut meta_selectors = HashMap::with_capacity(META_NAMES.len());
        for name in META_NAMES {
            let name_sel = Selector::parse(&format!("meta[name='{}']", name)).ok();
            let prop_sel = Selector::parse(&format!("meta[property='{}']", name)).ok();
            meta_selectors.insert(*name, (name_sel, prop_sel));
        }

        let heading_selectors = HEADING_SELECTORS
            .iter()
            .filter_map(|s| Selector::parse(s).ok())
            .collect();

        let expiry_phrases = expiry_phrases
            .into_iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        Self {
            invite_host: invite_host.into(),
            expiry_phrases,
            meta_selectors,
            heading_selectors,
        }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.invite_host.clone(), config.expiry_phrases.clone())
    }

    pub fn expiry_phrases(&self) -> &[String] {
        &self.expiry_phrases
    }

    /// Classify a successfully fetched invitation page
    pub fn classify(&self, link: &CanonicalLink, page: &FetchResult) -> ValidationRecord {
        let mut record = ValidationRecord::new(link.clone(), LinkStatus::Inactive);

        let final_host = page.final_url.host_str().unwrap_or_default();
        if !final_host.eq_ignore_ascii_case(&self.invite_host) {
            let host = if final_host.is_empty() {
                "unknown".to_string()
            } else {
                final_host.to_string()
            };
            tracing::debug!(link = %link, host = %host, "Invite redirected off-site");
            record.status = LinkStatus::RedirectedAway { host };
            return record;
        }

        match self.inspect(&page.body) {
            Ok(inspection) => Self::decide(record, inspection),
            Err(e) => {
                tracing::warn!(link = %link, error = %e, "Failed to parse invitation page");
                record.status = LinkStatus::ParsingError;
                record
            }
        }
    }

    /// Extract metadata and expiry signals from page markup
    pub fn inspect(&self, html: &str) -> Result<PageInspection, ClassifyError> {
        let document = Html::parse_document(html);
        let metadata = self.extract_metadata(&document)?;

        let visible = text::visible_text(&document).to_lowercase();
        let expired = self
            .expiry_phrases
            .iter()
            .any(|phrase| visible.contains(phrase.as_str()));

        Ok(PageInspection { metadata, expired })
    }

    fn decide(mut record: ValidationRecord, inspection: PageInspection) -> ValidationRecord {
        let PageInspection { metadata, expired } = inspection;

        // Expired pages still show the old name, which no longer applies
        if expired {
            record.status = LinkStatus::ExpiredOrFull;
            return record;
        }

        if let Some(image) = metadata.image {
            record.logo_url = image;
        }
        if let Some(name) = metadata.title.filter(|t| is_plausible_name(t)) {
            record.group_name = name;
            record.status = LinkStatus::Active;
        }
        record
    }
}

impl Default for InviteClassifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_INVITE_HOST,
            DEFAULT_EXPIRY_PHRASES.iter().map(|p| p.to_string()).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::LinkNormalizer;
    use crate::testing::invite_page;
    use crate::types::UNNAMED_GROUP_PLACEHOLDER;
    use std::time::Duration;
    use url::Url;

    const LINK: &str = "https://chat.whatsapp.com/ABCDEFGHIJ0123456";
    const LOGO: &str = "https://pps.whatsapp.net/v/t61.24694-24/123_n.jpg?ccb=11-4&oh=01";

    fn link() -> CanonicalLink {
        LinkNormalizer::default().normalize(LINK).unwrap()
    }

    fn fetched(final_url: &str, body: String) -> FetchResult {
        FetchResult {
            final_url: Url::parse(final_url).unwrap(),
            status_code: 200,
            body,
            fetch_duration: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_active_group() {
        let classifier = InviteClassifier::default();
        let page = fetched(LINK, invite_page(Some("Rust Jobs &amp; Gigs"), Some(LOGO), "Open this link to join"));

        let record = classifier.classify(&link(), &page);
        assert_eq!(record.status, LinkStatus::Active);
        assert_eq!(record.group_name, "Rust Jobs & Gigs");
        assert_eq!(record.logo_url, LOGO);
    }

    #[test]
    fn test_expiry_phrase_wins_over_title() {
        let classifier = InviteClassifier::default();
        let page = fetched(
            LINK,
            invite_page(Some("Old Group Name"), Some(LOGO), "This invite link was RESET by an admin"),
        );

        let record = classifier.classify(&link(), &page);
        assert_eq!(record.status, LinkStatus::ExpiredOrFull);
        assert_eq!(record.group_name, UNNAMED_GROUP_PLACEHOLDER);
        assert!(record.logo_url.is_empty());
    }

    #[test]
    fn test_every_default_phrase_marks_expired() {
        let classifier = InviteClassifier::default();
        for phrase in DEFAULT_EXPIRY_PHRASES {
            let page = fetched(LINK, invite_page(Some("Group"), None, &format!("Sorry, this {}.", phrase)));
            let record = classifier.classify(&link(), &page);
            assert_eq!(record.status, LinkStatus::ExpiredOrFull, "phrase {:?}", phrase);
        }
    }

    #[test]
    fn test_redirect_off_site() {
        let classifier = InviteClassifier::default();
        let page = fetched("https://www.whatsapp.com/", invite_page(Some("WhatsApp"), None, ""));

        let record = classifier.classify(&link(), &page);
        assert_eq!(
            record.status,
            LinkStatus::RedirectedAway {
                host: "www.whatsapp.com".to_string()
            }
        );
    }

    #[test]
    fn test_generic_invite_title_is_inactive() {
        let classifier = InviteClassifier::default();
        let page = fetched(LINK, invite_page(Some("WhatsApp Group Invite"), None, "Join"));

        let record = classifier.classify(&link(), &page);
        assert_eq!(record.status, LinkStatus::Inactive);
        assert_eq!(record.group_name, UNNAMED_GROUP_PLACEHOLDER);
    }

    #[test]
    fn test_heading_fallback_when_preview_title_missing() {
        let classifier = InviteClassifier::default();
        let body = "<html><body><h2>  Weekend   Hikers </h2><p>Join us</p></body></html>";

        let record = classifier.classify(&link(), &fetched(LINK, body.to_string()));
        assert_eq!(record.status, LinkStatus::Active);
        assert_eq!(record.group_name, "Weekend Hikers");
    }

    #[test]
    fn test_empty_page_is_inactive() {
        let classifier = InviteClassifier::default();
        let record = classifier.classify(&link(), &fetched(LINK, String::new()));
        assert_eq!(record.status, LinkStatus::Inactive);
        assert!(record.logo_url.is_empty());
    }

    #[test]
    fn test_implausible_logo_discarded() {
        let classifier = InviteClassifier::default();
        let page = fetched(
            LINK,
            invite_page(Some("Chess Club"), Some("javascript:alert(1)"), ""),
        );

        let record = classifier.classify(&link(), &page);
        assert_eq!(record.status, LinkStatus::Active);
        assert!(record.logo_url.is_empty());
    }

    #[test]
    fn test_script_text_is_not_visible() {
        let classifier = InviteClassifier::default();
        let body = "<html><head><meta property=\"og:title\" content=\"Gardeners\"></head><body><script>var m = \"group is full\";</script><p>Welcome</p></body></html>".to_string();

        let record = classifier.classify(&link(), &fetched(LINK, body));
        assert_eq!(record.status, LinkStatus::Active);
    }

    #[test]
    fn test_custom_phrase_list() {
        let classifier = InviteClassifier::new("chat.whatsapp.com", vec!["  Group Was Archived ".to_string()]);
        assert_eq!(classifier.expiry_phrases(), &["group was archived".to_string()]);

        let page = fetched(LINK, invite_page(Some("Archive"), None, "This group was archived."));
        assert_eq!(classifier.classify(&link(), &page).status, LinkStatus::ExpiredOrFull);

        let page = fetched(LINK, invite_page(Some("Archive"), None, "This group is full."));
        assert_eq!(classifier.classify(&link(), &page).status, LinkStatus::Active);
    }
}
