//! Document → plain text / Markdown rendering.
//!
//! No I/O is performed here; the renderer walks a normalized [`Document`]
//! and accumulates a string. Blocks are separated by one blank line and
//! paragraphs are never re-wrapped.

use crate::config::RenderConfig;
use crate::dom::{Document, NodeData, NodeId};
use crate::normalize::table_rows;

use super::escape::{
    calculate_fence_length, calculate_inline_code_ticks, escape_link_destination,
    escape_markdown_from,
};

/// Elements whose content never reaches the export.
const SKIPPED_TAGS: &[&str] = &["head", "title", "script", "style", "template", "noscript", "svg"];

/// Elements laid out as blocks.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "center", "dd", "details",
    "dialog", "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "html", "li", "main", "menu", "nav", "ol",
    "p", "pre", "section", "summary", "table", "tr", "ul",
];

fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

/// Tracks list context for numbering.
#[derive(Debug, Clone)]
struct ListContext {
    ordered: bool,
    counter: usize,
    items: usize,
    /// No blank lines between items.
    tight: bool,
}

/// Rendering state for one document (pure string accumulation).
pub struct TextRenderer<'a> {
    doc: &'a Document,
    config: &'a RenderConfig,
    output: String,
    line_prefix: String,
    list_stack: Vec<ListContext>,
    at_line_start: bool,
    has_line_content: bool,
    pending_newline: bool,
    /// Swallow the next collapsible space (right after a line start or an
    /// opening delimiter).
    suppress_space: bool,
    /// Content is collapsed onto one line (a table cell).
    single_line: bool,
}

impl<'a> TextRenderer<'a> {
    pub fn new(doc: &'a Document, config: &'a RenderConfig) -> Self {
        Self {
            doc,
            config,
            output: String::new(),
            line_prefix: String::new(),
            list_stack: Vec::new(),
            at_line_start: true,
            has_line_content: false,
            pending_newline: false,
            suppress_space: true,
            single_line: false,
        }
    }

    /// Render the whole document, consuming the renderer.
    pub fn render(mut self) -> String {
        self.walk_node(self.doc.root());
        self.finish()
    }

    fn finish(self) -> String {
        self.output.trim().to_owned()
    }

    fn markdown(&self) -> bool {
        self.config.is_markdown()
    }

    // --- line and block state ---

    fn ensure_line_started(&mut self) {
        if self.at_line_start {
            self.output.push_str(&self.line_prefix);
            self.at_line_start = false;
            self.suppress_space = true;
        }
    }

    /// Drop trailing spaces; returns whether any were removed.
    fn trim_trailing_spaces(&mut self) -> bool {
        let trimmed = self.output.trim_end_matches(' ').len();
        let removed = trimmed < self.output.len();
        self.output.truncate(trimmed);
        removed
    }

    fn write_newline(&mut self) {
        self.trim_trailing_spaces();
        self.output.push('\n');
        self.at_line_start = true;
        self.has_line_content = false;
    }

    fn write_blank_line(&mut self) {
        if !self.at_line_start {
            self.write_newline();
        }
        self.output.push_str(self.line_prefix.trim_end());
        self.output.push('\n');
    }

    fn in_tight_list(&self) -> bool {
        self.list_stack.last().is_some_and(|list| list.tight)
    }

    /// Break away from preceding content before a block.
    fn separate_block(&mut self) {
        if self.pending_newline || self.has_line_content {
            if self.in_tight_list() {
                if !self.at_line_start {
                    self.write_newline();
                }
            } else {
                self.write_blank_line();
            }
            self.pending_newline = false;
        }
    }

    fn start_block(&mut self) {
        self.separate_block();
        self.ensure_line_started();
    }

    fn end_block(&mut self) {
        self.pending_newline = true;
    }

    fn start_inline(&mut self) {
        if self.pending_newline {
            self.start_block();
        } else {
            self.ensure_line_started();
        }
    }

    fn mark_content(&mut self) {
        self.has_line_content = true;
        self.suppress_space = false;
    }

    fn push_space(&mut self) {
        if self.has_line_content
            && !self.suppress_space
            && !self.pending_newline
            && !self.output.ends_with(' ')
        {
            self.output.push(' ');
        }
    }

    fn push_inline(&mut self, s: &str) {
        self.start_inline();
        self.output.push_str(s);
        self.mark_content();
    }

    // --- tree walk ---

    fn walk_node(&mut self, id: NodeId) {
        let doc = self.doc;
        let Some(node) = doc.get(id) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => self.write_text(text),
            NodeData::Document => self.walk_children(id),
            NodeData::Element { .. } => self.walk_element(id),
            NodeData::Comment(_) | NodeData::Doctype { .. } => {}
        }
    }

    fn walk_children(&mut self, id: NodeId) {
        let doc = self.doc;
        for child in doc.children(id) {
            self.walk_node(child);
        }
    }

    fn walk_element(&mut self, id: NodeId) {
        let doc = self.doc;
        let tag = doc.tag(id).unwrap_or("");
        if SKIPPED_TAGS.contains(&tag) {
            return;
        }
        let markdown = self.markdown();

        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" if markdown => {
                self.start_block();
                let level = tag[1..].parse::<usize>().unwrap_or(1);
                self.output.push_str(&"#".repeat(level));
                self.output.push(' ');
                self.walk_children(id);
                self.end_block();
            }

            "ul" | "ol" if markdown => self.write_list(id, tag == "ol"),
            "li" if markdown && !self.list_stack.is_empty() => self.write_list_item(id),
            "blockquote" if markdown => self.write_blockquote(id),

            "dt" if markdown => {
                self.start_block();
                self.write_delimited(id, "**", "**");
                self.pending_newline = false;
            }
            "dd" if markdown => {
                if !self.at_line_start {
                    self.write_newline();
                }
                self.ensure_line_started();
                self.output.push_str(": ");
                self.walk_children(id);
                self.end_block();
            }

            "pre" => self.write_preformatted(id),
            "table" => self.write_table(id),

            "hr" => {
                if markdown {
                    self.start_block();
                    self.output.push_str("---");
                    self.mark_content();
                }
                self.end_block();
            }

            "br" if self.single_line => self.push_space(),
            "br" => {
                if self.has_line_content {
                    if markdown {
                        self.trim_trailing_spaces();
                        self.output.push('\\');
                    }
                    self.write_newline();
                }
            }

            "img" => self.write_image(id),
            "a" => self.write_link(id),
            "q" => {
                let open = self.config.open_quote.clone();
                let close = self.config.close_quote.clone();
                self.write_delimited(id, &open, &close);
            }

            "s" | "strike" | "del" => {
                if self.config.hide_strikethrough {
                    return;
                }
                if markdown {
                    self.write_delimited(id, "~~", "~~");
                } else {
                    self.walk_children(id);
                }
            }

            "em" | "i" | "cite" | "dfn" | "var" if markdown => self.write_delimited(id, "_", "_"),
            "strong" | "b" if markdown => self.write_delimited(id, "**", "**"),
            "code" | "tt" | "samp" if markdown => self.write_inline_code(id),

            _ if is_block_tag(tag) => {
                self.start_block();
                self.walk_children(id);
                self.end_block();
            }

            _ => self.walk_children(id),
        }
    }

    // --- inline content ---

    fn write_text(&mut self, text: &str) {
        let has_leading = text.starts_with(|c: char| c.is_ascii_whitespace());
        let has_trailing = text.ends_with(|c: char| c.is_ascii_whitespace());

        let words: Vec<&str> = text.split_ascii_whitespace().collect();
        if words.is_empty() {
            if !text.is_empty() {
                self.push_space();
            }
            return;
        }

        if has_leading {
            self.push_space();
        }
        let joined = words.join(" ");
        if self.markdown() {
            let line_start = self.at_line_start || self.pending_newline || !self.has_line_content;
            self.push_inline(&escape_markdown_from(&joined, line_start));
        } else {
            self.push_inline(&joined);
        }
        if has_trailing {
            self.push_space();
        }
    }

    /// Whether any descendant is laid out as a block.
    fn has_block_descendant(&self, id: NodeId) -> bool {
        self.doc.children(id).any(|child| {
            self.doc.tag(child).is_some_and(is_block_tag) || self.has_block_descendant(child)
        })
    }

    /// Wrap an element's inline content in delimiters.
    ///
    /// Empty content produces nothing, delimiters included. Whitespace at the
    /// edges of the content is moved outside the delimiters.
    fn write_delimited(&mut self, id: NodeId, open: &str, close: &str) {
        if self.has_block_descendant(id) {
            self.walk_children(id);
            return;
        }
        if self.doc.text_of(id).starts_with(|c: char| c.is_ascii_whitespace()) {
            self.push_space();
        }

        self.start_inline();
        let before = self.output.len();
        let had_content = self.has_line_content;
        let suppressed = self.suppress_space;

        self.output.push_str(open);
        self.has_line_content = true;
        self.suppress_space = true;
        self.walk_children(id);

        if self.output.len() == before + open.len() {
            self.output.truncate(before);
            self.has_line_content = had_content;
            self.suppress_space = suppressed;
            return;
        }

        let trailing = self.trim_trailing_spaces();
        self.output.push_str(close);
        self.mark_content();
        if trailing {
            self.output.push(' ');
        }
    }

    fn write_link(&mut self, id: NodeId) {
        let doc = self.doc;
        let href = doc.get_attr(id, "href").unwrap_or("").trim();
        let linkable = self.markdown()
            && !href.is_empty()
            && !href.starts_with('#')
            && !href.starts_with("mailto:");
        if !linkable {
            self.walk_children(id);
            return;
        }
        let close = format!("](<{}>)", escape_link_destination(href));
        self.write_delimited(id, "[", &close);
    }

    fn write_image(&mut self, id: NodeId) {
        let doc = self.doc;
        let config = self.config;
        let alt = doc
            .get_attr(id, "alt")
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
            .unwrap_or(config.default_image_alt.as_str());
        let src = doc.get_attr(id, "src").unwrap_or("").trim();

        if self.markdown() && !src.is_empty() {
            let image = format!(
                "![{}](<{}>)",
                escape_markdown_from(alt, false),
                escape_link_destination(src)
            );
            self.push_inline(&image);
        } else if !alt.is_empty() {
            self.write_text(alt);
        }
    }

    fn write_inline_code(&mut self, id: NodeId) {
        let content = self.doc.text_of(id);
        let content = content.split_ascii_whitespace().collect::<Vec<_>>().join(" ");
        if content.is_empty() {
            return;
        }
        let ticks = "`".repeat(calculate_inline_code_ticks(&content));
        let spacer = if content.starts_with('`') || content.ends_with('`') {
            " "
        } else {
            ""
        };
        if self.doc.text_of(id).starts_with(|c: char| c.is_ascii_whitespace()) {
            self.push_space();
        }
        self.push_inline(&format!("{ticks}{spacer}{content}{spacer}{ticks}"));
    }

    // --- blocks ---

    /// A list is tight when every item holds at most one paragraph and no
    /// quote, code block or table.
    fn is_tight_list(&self, list: NodeId) -> bool {
        let doc = self.doc;
        doc.children(list)
            .filter(|&item| doc.has_tag(item, "li"))
            .all(|item| {
                let mut paragraphs = 0;
                for child in doc.children(item) {
                    match doc.tag(child) {
                        Some("p" | "div") => paragraphs += 1,
                        Some("blockquote" | "pre" | "table" | "figure" | "dl") => return false,
                        _ => {}
                    }
                }
                paragraphs <= 1
            })
    }

    fn write_list(&mut self, id: NodeId, ordered: bool) {
        self.separate_block();
        let start = if ordered {
            self.doc
                .get_attr(id, "start")
                .and_then(|s| s.trim().parse::<usize>().ok())
                .unwrap_or(1)
        } else {
            1
        };
        let tight = self.is_tight_list(id);
        self.list_stack.push(ListContext {
            ordered,
            counter: start.saturating_sub(1),
            items: 0,
            tight,
        });
        self.walk_children(id);
        self.list_stack.pop();
        self.end_block();
    }

    fn write_list_item(&mut self, id: NodeId) {
        let Some(list) = self.list_stack.last_mut() else {
            return;
        };
        let first = list.items == 0;
        list.items += 1;
        list.counter += 1;
        let bullet = if list.ordered {
            format!("{}. ", list.counter)
        } else {
            "- ".to_owned()
        };
        let tight = list.tight;

        if !tight && !first && (self.has_line_content || self.pending_newline) {
            self.write_blank_line();
        } else if !self.at_line_start {
            self.write_newline();
        }
        self.pending_newline = false;

        self.ensure_line_started();
        self.output.push_str(&bullet);
        self.has_line_content = false;
        self.suppress_space = true;

        let old_prefix = self.line_prefix.clone();
        self.line_prefix.push_str(&" ".repeat(bullet.chars().count()));
        self.walk_children(id);
        self.line_prefix = old_prefix;
        self.pending_newline = false;
    }

    fn write_blockquote(&mut self, id: NodeId) {
        self.separate_block();
        let prefix = "> ";
        if !self.at_line_start {
            self.output.push_str(prefix);
        }
        let old_prefix = self.line_prefix.clone();
        self.line_prefix.push_str(prefix);
        self.walk_children(id);
        self.line_prefix = old_prefix;
        self.end_block();
    }

    /// Language of a code block from a `language-*` class on the `pre` or
    /// its `code` child.
    fn code_language(&self, pre: NodeId) -> Option<&'a str> {
        let doc = self.doc;
        let code = doc.find_child_by_tag(pre, "code");
        [Some(pre), code]
            .into_iter()
            .flatten()
            .flat_map(move |id| doc.element_classes(id))
            .find_map(|class| class.strip_prefix("language-"))
    }

    fn write_preformatted(&mut self, id: NodeId) {
        let text = self.doc.text_of(id);
        self.start_block();

        if self.markdown() {
            let fence = "`".repeat(calculate_fence_length(&text, '`'));
            let lang = self.code_language(id).unwrap_or("");
            self.output.push_str(&fence);
            self.output.push_str(lang);
            self.output.push('\n');
            self.at_line_start = true;
            for line in text.lines() {
                self.ensure_line_started();
                self.output.push_str(line);
                self.output.push('\n');
                self.at_line_start = true;
            }
            self.ensure_line_started();
            self.output.push_str(&fence);
        } else {
            for (i, line) in text.lines().enumerate() {
                if i > 0 {
                    self.output.push('\n');
                    self.at_line_start = true;
                }
                self.ensure_line_started();
                self.output.push_str(line);
            }
        }

        self.mark_content();
        self.end_block();
    }

    /// Render one table cell's content onto a single line.
    fn render_cell(&self, cell: NodeId) -> String {
        let mut inner = TextRenderer::new(self.doc, self.config);
        inner.single_line = true;
        inner.walk_children(cell);
        let text = inner.finish();
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn write_table(&mut self, id: NodeId) {
        let doc = self.doc;

        // Captions (or whatever they were demoted to) come first.
        for child in doc.children(id) {
            if doc
                .tag(child)
                .is_some_and(|tag| !matches!(tag, "tr" | "thead" | "tbody" | "tfoot" | "colgroup" | "col"))
            {
                self.walk_node(child);
            }
        }

        let rows: Vec<Vec<String>> = table_rows(doc, id)
            .into_iter()
            .map(|row| {
                doc.children(row)
                    .filter(|&c| doc.has_tag(c, "td") || doc.has_tag(c, "th"))
                    .map(|c| self.render_cell(c))
                    .collect()
            })
            .collect();

        let lines: Vec<String> = if self.markdown() {
            markdown_table_lines(&rows)
        } else {
            rows.iter()
                .map(|cells| {
                    cells
                        .iter()
                        .filter(|c| !c.is_empty())
                        .map(String::as_str)
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .filter(|line| !line.is_empty())
                .collect()
        };
        if lines.is_empty() {
            return;
        }

        self.start_block();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                self.output.push('\n');
                self.at_line_start = true;
            }
            self.ensure_line_started();
            self.output.push_str(line);
        }
        self.mark_content();
        self.end_block();
    }
}

/// Pipe-table lines: the first row is the header, short rows are padded.
fn markdown_table_lines(rows: &[Vec<String>]) -> Vec<String> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return Vec::new();
    }
    let line = |cells: &[String]| {
        let mut padded: Vec<&str> = cells.iter().map(String::as_str).collect();
        padded.resize(columns, "");
        format!("| {} |", padded.join(" | "))
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(line(&rows[0]));
    lines.push(format!("|{}", " --- |".repeat(columns)));
    lines.extend(rows[1..].iter().map(|row| line(row)));
    lines
}

/// Render a normalized document to text or Markdown, trimmed.
pub fn render(doc: &Document, config: &RenderConfig) -> String {
    TextRenderer::new(doc, config).render()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::normalize::normalize;

    fn text(html: &str) -> String {
        let config = RenderConfig::text();
        render(&normalize(Document::parse(html), &config), &config)
    }

    fn markdown(html: &str) -> String {
        let config = RenderConfig::markdown();
        render(&normalize(Document::parse(html), &config), &config)
    }

    #[test]
    fn test_simple_page() {
        let html = "<html><head><title>Home</title></head><body><h1>Home</h1><p>This is a test.</p></body></html>";
        assert_eq!(text(html), "Home\n\nThis is a test.");
        assert_eq!(markdown(html), "# Home\n\nThis is a test.");
    }

    #[test]
    fn test_markdown_link_and_unicode() {
        let html = "<h1>Home</h1><p>This is a тест with <a href=\"http://example.com\">a link</a>.</p>";
        assert_eq!(
            markdown(html),
            "# Home\n\nThis is a тест with [a link](<http://example.com>)."
        );
        assert_eq!(text(html), "Home\n\nThis is a тест with a link.");
    }

    #[test]
    fn test_fragment_and_mailto_links_render_text_only() {
        let html = "<p><a href=\"#top\">Top</a> or <a href=\"mailto:a@b.c\">mail</a></p>";
        assert_eq!(markdown(html), "Top or mail");
    }

    #[test]
    fn test_scripts_and_styles_skipped() {
        let html = "<style>p{}</style><p>a</p><script>var x;</script><noscript>js</noscript>";
        assert_eq!(text(html), "a");
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(text("<p>  a \n  b </p>\n\n<p>c</p>"), "a b\n\nc");
    }

    #[test]
    fn test_emphasis() {
        let html = "<p>This is <em>very</em> <strong>bold </strong>text</p>";
        assert_eq!(markdown(html), "This is _very_ **bold** text");
        assert_eq!(text(html), "This is very bold text");
    }

    #[test]
    fn test_markdown_lists() {
        let html = "<ul><li>one</li><li>two<ul><li>nested</li></ul></li></ul><ol start=\"3\"><li>three</li><li>four</li></ol>";
        assert_eq!(
            markdown(html),
            "- one\n- two\n  - nested\n\n3. three\n4. four"
        );
    }

    #[test]
    fn test_text_lists_demoted() {
        assert_eq!(text("<ul><li>one</li><li>two</li></ul>"), "one\n\ntwo");
    }

    #[test]
    fn test_blockquote() {
        let html = "<blockquote><p>a</p><p>b</p></blockquote>";
        assert_eq!(markdown(html), "> a\n>\n> b");
        assert_eq!(text(html), "a\n\nb");
    }

    #[test]
    fn test_code_block() {
        let html = "<pre><code class=\"language-rust\">fn main() {\n    x();\n}\n</code></pre>";
        assert_eq!(markdown(html), "```rust\nfn main() {\n    x();\n}\n```");
        assert_eq!(text(html), "fn main() {\n    x();\n}");
    }

    #[test]
    fn test_fence_grows_past_backticks() {
        let html = "<pre>```\nx\n```</pre>";
        assert_eq!(markdown(html), "````\n```\nx\n```\n````");
    }

    #[test]
    fn test_inline_code() {
        let html = "<p>Run <code>make all</code> now</p>";
        assert_eq!(markdown(html), "Run `make all` now");
        assert_eq!(text(html), "Run “make all” now");
    }

    #[test]
    fn test_custom_quotes() {
        let mut config = RenderConfig::text();
        config.open_quote = "<<".to_owned();
        config.close_quote = ">>".to_owned();
        let doc = normalize(Document::parse("<p><q>hi</q></p>"), &config);
        assert_eq!(render(&doc, &config), "<<hi>>");
    }

    #[test]
    fn test_images() {
        let html = "<p><img src=\"a.png\" alt=\"A cat\"><img src=\"b.png\"></p>";
        assert_eq!(markdown(html), "![A cat](<a.png>)![](<b.png>)");
        assert_eq!(text(html), "A cat");

        let mut config = RenderConfig::text();
        config.default_image_alt = "[image]".to_owned();
        let doc = normalize(Document::parse(html), &config);
        assert_eq!(render(&doc, &config), "A cat[image]");
    }

    #[test]
    fn test_strikethrough() {
        let html = "<p>keep <del>drop</del> this</p>";
        assert_eq!(markdown(html), "keep ~~drop~~ this");
        assert_eq!(text(html), "keep drop this");

        let mut config = RenderConfig::text();
        config.hide_strikethrough = true;
        let doc = normalize(Document::parse(html), &config);
        assert_eq!(render(&doc, &config), "keep this");
    }

    #[test]
    fn test_line_breaks_and_rules() {
        let html = "<p>a<br>b</p><hr><p>c</p>";
        assert_eq!(markdown(html), "a\\\nb\n\n---\n\nc");
        assert_eq!(text(html), "a\nb\n\nc");
    }

    #[test]
    fn test_markdown_table() {
        let html = "<table><tr><th>Name</th><th>Value</th></tr><tr><td>a</td><td><em>1</em></td></tr><tr><td>b</td></tr></table>";
        assert_eq!(
            markdown(html),
            "| Name | Value |\n| --- | --- |\n| a | _1_ |\n| b |  |"
        );
        assert_eq!(text(html), "Name Value\na 1\nb");
    }

    #[test]
    fn test_line_break_inside_table_cell() {
        let html = "<table><tr><th>Step</th></tr><tr><td>x<br>y</td></tr></table>";
        assert_eq!(markdown(html), "| Step |\n| --- |\n| x y |");
        assert_eq!(text(html), "Step\nx y");
    }

    #[test]
    fn test_markdown_escaping() {
        assert_eq!(markdown("<p>*not bold* [x]</p>"), "\\*not bold\\* \\[x\\]");
        assert_eq!(text("<p>*as is* [x]</p>"), "*as is* [x]");
        assert_eq!(markdown("<p>2024. A good year</p>"), "2024\\. A good year");
        assert_eq!(markdown("<p>1) item</p>"), "1\\) item");
        assert_eq!(markdown("<p>---</p>"), "\\---");
        assert_eq!(markdown("<p>Title<br>===</p>"), "Title\\\n\\===");
        assert_eq!(text("<p>1) item</p>"), "1) item");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(text(""), "");
        assert_eq!(markdown("<p>  </p><div></div>"), "");
    }
}
