//! Structural normalization of a page before emission.
//!
//! The passes run over the whole tree, strictly in this order:
//!
//! 1. **Kill** - remove elements matching the configured kill selectors
//! 2. **Unmark** - collapse `mark` / `kbd` to their bare text
//! 3. **Flatten tables** - (optional) turn each table into one sentence-joined paragraph
//! 4. **Demote** - (plain text only) strip Markdown-significant structure
//!
//! Killing first keeps removed subtrees out of every later pass, and tables
//! are flattened before demotion so they become prose rather than `div`s.

use crate::config::RenderConfig;
use crate::dom::{Document, NodeId, SelectorSet};

/// Separator between cells of one table row when flattening.
pub const CELL_SEPARATOR: &str = ", ";
/// Separator between table rows when flattening.
pub const ROW_SEPARATOR: &str = ". ";

/// Run every normalization pass the configuration asks for.
pub fn normalize(mut doc: Document, config: &RenderConfig) -> Document {
    kill_tags(&mut doc, &config.kill_tags);
    unwrap_marks(&mut doc);
    if config.plain_tables {
        flatten_tables(&mut doc);
    }
    if !config.is_markdown() {
        demote_structure(&mut doc, &config.list_item_mark);
    }
    doc
}

/// Remove every element matching a kill selector, subtree included.
///
/// Matching happens against the untouched tree, so the result does not
/// depend on the order of the selectors.
pub fn kill_tags(doc: &mut Document, kill: &SelectorSet) {
    if kill.is_empty() {
        return;
    }
    let doomed: Vec<_> = doc
        .elements()
        .into_iter()
        .filter(|&id| kill.matches(doc, id))
        .collect();
    for id in doomed {
        doc.detach(id);
    }
}

/// Replace highlight and keyboard markup with its text.
pub fn unwrap_marks(doc: &mut Document) {
    for id in doc.elements() {
        if !(doc.has_tag(id, "mark") || doc.has_tag(id, "kbd")) || !doc.is_attached(id) {
            continue;
        }
        let text = doc.text_of(id);
        let text_node = doc.create_text(text);
        doc.replace(id, text_node);
    }
}

/// Replace each table with a paragraph of its joined cell text.
pub fn flatten_tables(doc: &mut Document) {
    for id in doc.elements() {
        if !doc.has_tag(id, "table") || !doc.is_attached(id) {
            continue;
        }
        let text = flatten_table_text(doc, id);
        if text.is_empty() {
            doc.detach(id);
            continue;
        }
        let p = doc.create_element("p", vec![]);
        doc.append_text(p, &text);
        doc.replace(id, p);
    }
}

fn flatten_table_text(doc: &Document, table: NodeId) -> String {
    let mut rows = Vec::new();

    if let Some(caption) = doc.find_child_by_tag(table, "caption") {
        let text = collapse_whitespace(&doc.text_of(caption));
        if !text.is_empty() {
            rows.push(text);
        }
    }

    for row in table_rows(doc, table) {
        let cells: Vec<String> = doc
            .children(row)
            .filter(|&c| doc.has_tag(c, "td") || doc.has_tag(c, "th"))
            .map(|c| collapse_whitespace(&doc.text_of(c)))
            .filter(|t| !t.is_empty())
            .collect();
        if !cells.is_empty() {
            rows.push(cells.join(CELL_SEPARATOR));
        }
    }

    rows.join(ROW_SEPARATOR)
}

/// Rows belonging to a table, not descending into nested tables.
pub(crate) fn table_rows(doc: &Document, table: NodeId) -> Vec<NodeId> {
    let mut rows = Vec::new();
    let mut stack: Vec<NodeId> = doc.children(table).collect();
    stack.reverse();
    while let Some(id) = stack.pop() {
        match doc.tag(id) {
            Some("tr") => rows.push(id),
            Some("thead" | "tbody" | "tfoot") => {
                let mut children: Vec<_> = doc.children(id).collect();
                children.reverse();
                stack.extend(children);
            }
            _ => {}
        }
    }
    rows
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Flatten structure that only means something in Markdown.
///
/// Headings, captions and list items become paragraphs; lists, quotes and
/// figures become plain blocks; inline code becomes a quoted span. A
/// non-empty `list_item_mark` is kept in front of each former list item.
pub fn demote_structure(doc: &mut Document, list_item_mark: &str) {
    for id in doc.elements() {
        let Some(tag) = doc.tag(id) else {
            continue;
        };
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "caption" | "figcaption" => {
                doc.rename(id, "p");
            }
            "li" => {
                doc.rename(id, "p");
                if !list_item_mark.is_empty() {
                    let mark = doc.create_text(format!("{list_item_mark} "));
                    doc.prepend(id, mark);
                }
            }
            "ul" | "ol" | "blockquote" | "figure" => doc.rename(id, "div"),
            "code" if !doc.has_ancestor(id, "pre") => doc.rename(id, "q"),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportConfig;

    fn body_tags(doc: &Document) -> Vec<String> {
        let body = doc.body().unwrap();
        doc.elements()
            .into_iter()
            .filter(|&id| id != body && doc.is_attached(id) && doc.has_ancestor(id, "body"))
            .filter_map(|id| doc.tag(id).map(str::to_owned))
            .collect()
    }

    fn config(yaml: &str) -> RenderConfig {
        RenderConfig::from_export(&ExportConfig::from_yaml(yaml).unwrap())
    }

    #[test]
    fn test_kill_tags_removes_subtrees() {
        let doc = Document::parse("<nav><a href='x.html'>x</a></nav><div class='ad'><p>buy</p></div><p>keep</p>");
        let doc = normalize(doc, &config("markdown: true\nkill_tags: [nav, .ad]"));

        assert_eq!(body_tags(&doc), vec!["p"]);
        assert_eq!(doc.text_of(doc.body().unwrap()), "keep");
    }

    #[test]
    fn test_marks_collapse_to_text() {
        let doc = Document::parse("<p>Press <kbd>Ctrl</kbd>+<kbd>C</kbd> to <mark>copy</mark></p>");
        let doc = normalize(doc, &config("markdown: true"));

        assert_eq!(body_tags(&doc), vec!["p"]);
        assert_eq!(doc.text_of(doc.body().unwrap()), "Press Ctrl+C to copy");
    }

    #[test]
    fn test_flatten_tables() {
        let doc = Document::parse(concat!(
            "<table><thead><tr><th>Name</th><th>Value</th></tr></thead>",
            "<tbody><tr><td>a</td><td>1</td></tr><tr><td> b </td><td></td></tr></tbody></table>",
        ));
        let doc = normalize(doc, &config("plain_tables: true"));

        assert_eq!(body_tags(&doc), vec!["p"]);
        assert_eq!(doc.text_of(doc.body().unwrap()), "Name, Value. a, 1. b");
    }

    #[test]
    fn test_tables_kept_without_flag() {
        let doc = Document::parse("<table><tr><td>a</td></tr></table>");
        let doc = normalize(doc, &config("markdown: true"));

        assert!(body_tags(&doc).contains(&"table".to_owned()));
    }

    #[test]
    fn test_demotion_in_text_mode() {
        let doc = Document::parse(concat!(
            "<h2>Title</h2><ul><li>one</li></ul><blockquote>q</blockquote>",
            "<p><code>x</code></p><pre><code>y</code></pre>",
        ));
        let doc = normalize(doc, &config(""));

        assert_eq!(body_tags(&doc), vec!["p", "div", "p", "div", "p", "q", "pre", "code"]);
    }

    #[test]
    fn test_no_demotion_in_markdown_mode() {
        let doc = Document::parse("<h2>Title</h2><ol><li>one</li></ol>");
        let doc = normalize(doc, &config("markdown: true"));

        assert_eq!(body_tags(&doc), vec!["h2", "ol", "li"]);
    }

    #[test]
    fn test_list_item_mark() {
        let doc = Document::parse("<ul><li>one</li><li>two</li></ul>");
        let doc = normalize(doc, &config("list_item_mark: '*'"));

        assert_eq!(doc.text_of(doc.body().unwrap()), "* one* two");
    }

    #[test]
    fn test_killed_table_is_not_flattened() {
        let doc = Document::parse("<table class='skip'><tr><td>a</td></tr></table><p>b</p>");
        let doc = normalize(doc, &config("plain_tables: true\nkill_tags: [table.skip]"));

        assert_eq!(doc.text_of(doc.body().unwrap()), "b");
    }
}
