use crate::dom::{Attribute, Document};
use crate::error::Result;

use super::{LINK_TITLE, ThemeHandler};

/// Fallback handler: advertises the export as an alternate representation
/// in the page head.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericTheme;

impl ThemeHandler for GenericTheme {
    fn name(&self) -> &str {
        "generic"
    }

    fn stylesheet(&self) -> String {
        String::new()
    }

    fn modify_html(&self, html: &str, href: &str) -> Result<String> {
        let mut doc = Document::parse(html);
        if let Some(head) = doc.head() {
            let link = doc.create_element(
                "link",
                vec![
                    Attribute::new("href", href),
                    Attribute::new("rel", "alternate"),
                    Attribute::new("title", LINK_TITLE),
                ],
            );
            doc.append(head, link);
        }
        Ok(doc.to_html())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_appended_to_head() {
        let html = "<html><head><title>T</title></head><body><p>x</p></body></html>";
        let out = GenericTheme.modify_html(html, "index.txt").unwrap();

        assert_eq!(
            out,
            "<html><head><title>T</title><link href=\"index.txt\" rel=\"alternate\" title=\"Text export\"></head><body><p>x</p></body></html>"
        );
    }
}
