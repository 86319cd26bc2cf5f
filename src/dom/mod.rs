//! Page Document: the mutable tree one page's HTML is parsed into.
//!
//! - [`arena`]: index-linked node storage and tree surgery
//! - [`tree_sink`]: html5ever parsing into the arena
//! - [`selector`]: CSS selector matching (used for kill tags)
//! - [`serialize`]: writing the tree back out as HTML

mod arena;
mod selector;
mod serialize;
mod tree_sink;

pub use arena::{Attribute, ChildrenIter, Document, Node, NodeData, NodeId};
pub use selector::{ElementRef, SelectorSet, SiteSelectors};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use tree_sink::DocumentSink;

impl Document {
    /// Parse an HTML document or fragment.
    ///
    /// Fragments get the usual `html`/`head`/`body` skeleton from the
    /// HTML5 tree builder.
    pub fn parse(html: &str) -> Document {
        let sink = DocumentSink::new();
        parse_document(sink, ParseOpts::default())
            .from_utf8()
            .one(html.as_bytes())
            .into_document()
    }

    /// The `head` element, if the document has one.
    pub fn head(&self) -> Option<NodeId> {
        let html = self.find_child_by_tag(self.root(), "html")?;
        self.find_child_by_tag(html, "head")
    }

    /// The `body` element, if the document has one.
    pub fn body(&self) -> Option<NodeId> {
        let html = self.find_child_by_tag(self.root(), "html")?;
        self.find_child_by_tag(html, "body")
    }
}
