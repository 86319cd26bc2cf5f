//! The per-page pipeline: parse, rewrite, normalize, emit.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::RenderConfig;
use crate::dom::Document;
use crate::error::Result;
use crate::links;
use crate::normalize::normalize;
use crate::registry::PageRegistry;
use crate::text;
use crate::theme::ThemeHandler;

/// Position reached while concatenating pages into a combined export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombineCursor {
    /// Pages written so far.
    pub page: usize,
    /// Line of the combined export the next page starts on (0-based).
    pub line_offset: usize,
}

/// Outcome of writing a combined export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CombineSummary {
    pub pages: usize,
    /// Registered pages that never contributed.
    pub skipped: usize,
    pub lines: usize,
}

pub struct Renderer {
    config: RenderConfig,
    theme: Box<dyn ThemeHandler>,
    stylesheet: String,
    registry: PageRegistry,
}

impl Renderer {
    /// Build a renderer; the theme's stylesheet is fetched once here.
    pub fn new(config: RenderConfig, theme: Box<dyn ThemeHandler>) -> Self {
        let stylesheet = theme.stylesheet();
        debug!(
            "Using theme handler {} ({} bytes of stylesheet)",
            theme.name(),
            stylesheet.len()
        );
        Self {
            config,
            theme,
            stylesheet,
            registry: PageRegistry::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn registry(&self) -> &PageRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PageRegistry {
        &mut self.registry
    }

    /// Convert one page to export text.
    ///
    /// With `rel_url` (the page's site URL) links are rewritten for a
    /// combined export, otherwise to sibling export files.
    pub fn render_doc(&self, html: &str, base_url: &str, rel_url: Option<&str>) -> String {
        let mut doc = Document::parse(html);
        if !self.stylesheet.is_empty() {
            inject_stylesheet(&mut doc, &self.stylesheet);
        }

        let ext = &self.config.file_ext;
        let doc = match rel_url {
            Some(rel_url) => links::rewrite_combined(doc, base_url, rel_url, ext),
            None => links::rewrite_separate(doc, base_url, ext),
        };
        let doc = normalize(doc, &self.config);
        text::render(&doc, &self.config)
    }

    /// Render a page and write it to `path`, creating parent directories.
    pub fn write_export(&self, html: &str, base_url: &str, path: &Path) -> Result<()> {
        let text = self.render_doc(html, base_url, None);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, format!("{text}\n"))?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    /// Let the theme link the export from the original page.
    pub fn add_link(&self, html: &str, href: &str) -> Result<String> {
        self.theme.modify_html(html, href)
    }

    /// Hold a page back for the combined export.
    pub fn add_doc(&mut self, html: &str, base_url: &str, rel_url: &str) -> Result<()> {
        self.registry.contribute(html, base_url, rel_url)
    }

    fn page_separator(&self) -> &'static str {
        if self.config.is_markdown() {
            "\n\n---\n\n"
        } else {
            "\n\n"
        }
    }

    /// Render every contributed page, in registry order, into one file.
    ///
    /// Slots that were never filled are reported and skipped.
    pub fn write_combined(&self, path: &Path) -> Result<CombineSummary> {
        let separator = self.page_separator();
        let separator_lines = separator.matches('\n').count();

        let mut cursor = CombineCursor::default();
        let mut content = String::new();
        let mut skipped = 0;

        for (url, slot) in self.registry.iter() {
            let Some(slot) = slot else {
                warn!("Page {url} was never rendered; leaving it out of the combined export");
                skipped += 1;
                continue;
            };

            let text = self.render_doc(&slot.html, &slot.base_url, Some(&slot.site_url));
            if cursor.page > 0 {
                content.push_str(separator);
                cursor.line_offset += separator_lines;
            }
            debug!(
                "Combined page {} ({url}) starts at line {}",
                cursor.page + 1,
                cursor.line_offset + 1
            );
            cursor.line_offset += text.matches('\n').count();
            content.push_str(&text);
            cursor.page += 1;
        }
        content.push('\n');

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &content)?;

        Ok(CombineSummary {
            pages: cursor.page,
            skipped,
            lines: content.lines().count(),
        })
    }
}

/// Append a `style` element carrying `css` to the document head.
fn inject_stylesheet(doc: &mut Document, css: &str) {
    let Some(head) = doc.head() else {
        return;
    };
    let style = doc.create_element("style", vec![]);
    doc.append_text(style, css);
    doc.append(head, style);
}
