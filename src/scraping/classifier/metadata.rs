//! Preview metadata: group name and logo from OpenGraph tags and headings

use scraper::{ElementRef, Html};
use url::Url;

use super::{ClassifyError, InviteClassifier};
use crate::types::UNNAMED_GROUP_PLACEHOLDER;

/// File extensions accepted for a logo URL
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".bmp"];

/// Untrusted fields pulled from an invitation page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    /// Preview title, or first heading when the preview title is absent
    pub title: Option<String>,
    /// Preview image that passed the image URL check
    pub image: Option<String>,
}

impl InviteClassifier {
    pub(super) fn extract_metadata(&self, document: &Html) -> Result<PageMetadata, ClassifyError> {
        let title = match self.get_meta_content(document, "og:title")? {
            Some(title) => Some(title),
            None => self.first_heading(document),
        };

        let image = self
            .get_meta_content(document, "og:image")?
            .filter(|url| is_plausible_image_url(url));

        Ok(PageMetadata { title, image })
    }

    /// Non-empty content of a `<meta>` tag matched by name or property
    fn get_meta_content(&self, document: &Html, name: &str) -> Result<Option<String>, ClassifyError> {
        let (name_sel, prop_sel) = self
            .meta_selectors
            .get(name)
            .ok_or_else(|| ClassifyError::Selector(name.to_string()))?;

        if name_sel.is_none() && prop_sel.is_none() {
            return Err(ClassifyError::Selector(name.to_string()));
        }

        let content = [prop_sel, name_sel]
            .into_iter()
            .flatten()
            .filter_map(|sel| document.select(sel).next())
            .filter_map(|elem| elem.value().attr("content"))
            .map(collapse_whitespace)
            .find(|c| !c.is_empty());

        Ok(content)
    }

    fn first_heading(&self, document: &Html) -> Option<String> {
        self.heading_selectors
            .iter()
            .filter_map(|sel| document.select(sel).next())
            .map(element_text)
            .find(|t| !t.is_empty())
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A name is plausible when present and not the generic invite page title
pub fn is_plausible_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty()
        && name != UNNAMED_GROUP_PLACEHOLDER
        && !name.to_lowercase().contains("invite")
}

/// An `http(s)` URL whose path ends in an image file extension
pub fn is_plausible_image_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw.trim()) else {
        return false;
    };
    if url.scheme() != "https" && url.scheme() != "http" {
        return false;
    }
    if url.host_str().map_or(true, str::is_empty) {
        return false;
    }

    let path = url.path().to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_shape() {
        assert!(is_plausible_image_url(
            "https://pps.whatsapp.net/v/t61.24694-24/1_n.jpg?ccb=11-4&oh=01"
        ));
        assert!(is_plausible_image_url("http://cdn.example.com/logo.PNG"));
        assert!(!is_plausible_image_url("https://example.com/logo"));
        assert!(!is_plausible_image_url("https://example.com/page.html"));
        assert!(!is_plausible_image_url("data:image/png;base64,AAAA"));
        assert!(!is_plausible_image_url("/relative/logo.png"));
        assert!(!is_plausible_image_url(""));
    }

    #[test]
    fn test_name_plausibility() {
        assert!(is_plausible_name("Rust Jobs"));
        assert!(!is_plausible_name("  "));
        assert!(!is_plausible_name("WhatsApp Group INVITE"));
        assert!(!is_plausible_name(UNNAMED_GROUP_PLACEHOLDER));
    }

    #[test]
    fn test_meta_by_name_attribute() {
        let classifier = InviteClassifier::default();
        let document = Html::parse_document(
            r#"<html><head><meta name="og:title" content=" Book   Club "></head></html>"#,
        );
        let metadata = classifier.extract_metadata(&document).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Book Club"));
        assert_eq!(metadata.image, None);
    }

    #[test]
    fn test_empty_preview_title_falls_back_to_strong() {
        let classifier = InviteClassifier::default();
        let document = Html::parse_document(
            r#"<html><head><meta property="og:title" content=""></head><body><strong>Cyclists</strong></body></html>"#,
        );
        let metadata = classifier.extract_metadata(&document).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Cyclists"));
    }
}
