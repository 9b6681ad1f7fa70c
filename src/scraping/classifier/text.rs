//! Visible text extraction

use scraper::Html;

/// Elements whose text never renders
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// All rendered text of a document, whitespace collapsed to single spaces
pub(super) fn visible_text(document: &Html) -> String {
    let mut text = String::new();

    for node in document.root_element().descendants() {
        let Some(text_node) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|elem| HIDDEN_ELEMENTS.contains(&elem.name()))
        });
        if hidden {
            continue;
        }

        for word in text_node.split_whitespace() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(word);
        }
    }

    text
}
