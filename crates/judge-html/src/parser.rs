//! Document parser
//!
//! Builds the arena DOM from the token stream. Unlike the validator it
//! never fails: stray end tags are dropped and unclosed elements are closed
//! at the end of input. Every node keeps the position of its token.

use judge_dom::{Document, DomTree, Node, NodeId};

use crate::tag_spec::TagSpecTable;
use crate::tokenizer::{TokenKind, Tokenizer};

/// Lenient HTML tree builder
pub struct HtmlParser<'t> {
    specs: &'t TagSpecTable,
}

impl HtmlParser<'static> {
    /// Create a parser using the bundled tag table for void elements
    pub fn new() -> Self {
        Self::with_tag_specs(TagSpecTable::builtin())
    }
}

impl<'t> HtmlParser<'t> {
    pub fn with_tag_specs(specs: &'t TagSpecTable) -> Self {
        Self { specs }
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Document {
        let mut tree = DomTree::new();
        // Open elements, innermost last; the document node is never popped
        let mut open: Vec<(String, NodeId)> = Vec::new();
        let mut tokens = 0usize;

        for token in Tokenizer::new(html) {
            tokens += 1;
            let parent = open.last().map(|(_, id)| *id).unwrap_or(tree.root());

            match token.kind {
                TokenKind::StartTag { name, attributes, self_closing } => {
                    let id = tree.create_element(&name, token.position);
                    if let Some(element) = tree.get_mut(id).and_then(Node::as_element_mut) {
                        for attr in &attributes {
                            element.set_attr(&attr.name, &attr.value);
                        }
                    }
                    tree.append_child(parent, id);
                    if !self_closing && !self.specs.is_void(&name) {
                        open.push((name, id));
                    }
                }
                TokenKind::EndTag { name } => {
                    match open.iter().rposition(|(open_name, _)| *open_name == name) {
                        Some(index) => open.truncate(index),
                        None => tracing::trace!(tag = %name, "ignoring stray end tag"),
                    }
                }
                TokenKind::Text(text) => {
                    if !text.trim().is_empty() {
                        let id = tree.create_text(&text, token.position);
                        tree.append_child(parent, id);
                    }
                }
                TokenKind::Comment(text) => {
                    let id = tree.create_comment(&text, token.position);
                    tree.append_child(parent, id);
                }
                TokenKind::Doctype(name) => {
                    let id = tree.create_doctype(&name, token.position);
                    tree.append_child(parent, id);
                }
            }
        }

        tracing::debug!(tokens, nodes = tree.len(), unclosed = open.len(), "parsed html document");
        Document::new(tree)
    }
}

impl Default for HtmlParser<'static> {
    fn default() -> Self {
        Self::new()
    }
}
