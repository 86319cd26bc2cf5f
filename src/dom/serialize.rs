//! HTML serialization of a [`Document`] through html5ever's serializer.

use std::io;

use html5ever::QualName;
use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};

use super::arena::{Document, NodeData, NodeId};

/// A node viewed as something html5ever can serialize.
struct SerializableNode<'a> {
    doc: &'a Document,
    id: NodeId,
}

enum SerializeOp {
    Open(NodeId),
    Close(QualName),
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let mut stack: Vec<SerializeOp> = match traversal_scope {
            TraversalScope::IncludeNode => vec![SerializeOp::Open(self.id)],
            TraversalScope::ChildrenOnly(_) => {
                let mut children: Vec<_> = self.doc.children(self.id).map(SerializeOp::Open).collect();
                children.reverse();
                children
            }
        };

        while let Some(op) = stack.pop() {
            let id = match op {
                SerializeOp::Close(name) => {
                    serializer.end_elem(name)?;
                    continue;
                }
                SerializeOp::Open(id) => id,
            };
            let Some(node) = self.doc.get(id) else {
                continue;
            };

            match &node.data {
                NodeData::Element { name, attrs } => {
                    serializer.start_elem(
                        name.clone(),
                        attrs.iter().map(|a| (&a.name, a.value.as_str())),
                    )?;
                    stack.push(SerializeOp::Close(name.clone()));
                    let mut children: Vec<_> = self.doc.children(id).collect();
                    children.reverse();
                    stack.extend(children.into_iter().map(SerializeOp::Open));
                }
                NodeData::Text(text) => serializer.write_text(text)?,
                NodeData::Comment(text) => serializer.write_comment(text)?,
                NodeData::Doctype { name } => serializer.write_doctype(name)?,
                NodeData::Document => {
                    let mut children: Vec<_> = self.doc.children(id).collect();
                    children.reverse();
                    stack.extend(children.into_iter().map(SerializeOp::Open));
                }
            }
        }

        Ok(())
    }
}

impl Document {
    /// Serialize the whole document back to HTML.
    pub fn to_html(&self) -> String {
        self.serialize_scope(self.root(), TraversalScope::ChildrenOnly(None))
    }

    fn serialize_scope(&self, id: NodeId, traversal_scope: TraversalScope) -> String {
        let node = SerializableNode { doc: self, id };
        let opts = SerializeOpts {
            traversal_scope,
            ..Default::default()
        };

        let mut bytes = Vec::new();
        // Writing into a Vec cannot fail.
        if serialize(&mut bytes, &node, opts).is_err() {
            return String::new();
        }
        String::from_utf8(bytes).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::{Attribute, Document};

    #[test]
    fn test_round_trip_keeps_structure() {
        let html = "<!DOCTYPE html><html><head><title>T</title></head><body><p class=\"x\">a &amp; b</p></body></html>";
        let doc = Document::parse(html);

        assert_eq!(doc.to_html(), html);
    }

    #[test]
    fn test_created_elements_serialize() {
        let mut doc = Document::parse("<p>x</p>");
        let small = doc.create_element("small", vec![]);
        let a = doc.create_element(
            "a",
            vec![Attribute::new("href", "index.txt"), Attribute::new("download", "")],
        );
        doc.append(small, a);
        doc.append_text(a, "Open text");
        let body = doc.body().unwrap();
        doc.append(body, small);

        assert!(doc.to_html().ends_with(
            "<p>x</p><small><a href=\"index.txt\" download=\"\">Open text</a></small></body></html>"
        ));
    }
}
