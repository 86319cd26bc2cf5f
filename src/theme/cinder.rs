use crate::dom::{Attribute, Document};
use crate::error::Result;

use super::{LINK_TITLE, ThemeHandler};

/// Handler for the Cinder theme: a download link at the top of the footer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CinderTheme;

impl ThemeHandler for CinderTheme {
    fn name(&self) -> &str {
        "cinder"
    }

    fn stylesheet(&self) -> String {
        String::new()
    }

    fn modify_html(&self, html: &str, href: &str) -> Result<String> {
        let mut doc = Document::parse(html);
        let footer = doc
            .body()
            .and_then(|body| doc.find_child_by_tag(body, "footer"));

        // Pages without a footer are returned re-serialized but otherwise untouched.
        if let Some(footer) = footer {
            let small = doc.create_element("small", vec![]);
            let a = doc.create_element(
                "a",
                vec![
                    Attribute::new("href", href),
                    Attribute::new("title", LINK_TITLE),
                    Attribute::new("download", ""),
                    Attribute::new("class", "txt-download"),
                ],
            );
            doc.append_text(a, "Open text");
            doc.append(small, a);
            doc.prepend(footer, small);
        }
        Ok(doc.to_html())
    }
}
