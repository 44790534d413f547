//! Document - High-level document API

use crate::{DomTree, NodeId};

/// Parsed HTML document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    tree: DomTree,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
}

impl Document {
    /// Wrap a built tree and locate its html, head and body elements
    pub fn new(tree: DomTree) -> Self {
        let mut document = Self {
            tree,
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
        };
        document.finalize();
        document
    }

    /// Create an empty document (no structure)
    pub fn empty() -> Self {
        Self::new(DomTree::new())
    }

    fn finalize(&mut self) {
        let root = self.tree.root();
        self.html_element = self.tree.find_first(root, "html").unwrap_or(NodeId::NONE);
        self.head_element = self.tree.find_first(root, "head").unwrap_or(NodeId::NONE);
        self.body_element = self.tree.find_first(root, "body").unwrap_or(NodeId::NONE);
        tracing::trace!(
            nodes = self.tree.len(),
            has_html = self.html_element.is_valid(),
            "document finalized"
        );
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// First element below the document node
    pub fn document_element(&self) -> Option<NodeId> {
        self.tree.element_children(self.tree.root()).next()
    }

    /// Get <html> element
    pub fn html(&self) -> Option<NodeId> {
        Some(self.html_element).filter(|id| id.is_valid())
    }

    /// Get <head> element
    pub fn head(&self) -> Option<NodeId> {
        Some(self.head_element).filter(|id| id.is_valid())
    }

    /// Get <body> element
    pub fn body(&self) -> Option<NodeId> {
        Some(self.body_element).filter(|id| id.is_valid())
    }

    /// Get document title
    pub fn title(&self) -> String {
        self.tree
            .find_first(self.tree.root(), "title")
            .map(|title| self.tree.text_content(title).trim().to_string())
            .unwrap_or_default()
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .find(|&node| self.tree.element(node).and_then(|e| e.id.as_deref()) == Some(id))
    }

    /// Contents of every `<style>` element, joined in document order
    pub fn style_text(&self) -> String {
        self.tree
            .find_all(self.tree.root(), "style")
            .into_iter()
            .map(|style| self.tree.text_content(style))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<DomTree> for Document {
    fn from(tree: DomTree) -> Self {
        Self::new(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    #[test]
    fn test_finalize_finds_structure() {
        let mut tree = DomTree::new();
        let html = tree.create_element("html", Position::START);
        let head = tree.create_element("head", Position::new(1, 0));
        let style = tree.create_element("style", Position::new(2, 0));
        let css = tree.create_text("p { color: red; }", Position::new(2, 7));
        let body = tree.create_element("body", Position::new(3, 0));
        tree.append_child(tree.root(), html);
        tree.append_child(html, head);
        tree.append_child(head, style);
        tree.append_child(style, css);
        tree.append_child(html, body);
        if let Some(e) = tree.get_mut(body).and_then(|n| n.as_element_mut()) {
            e.set_attr("id", "content");
        }

        let doc = Document::new(tree);
        assert_eq!(doc.html(), Some(html));
        assert_eq!(doc.head(), Some(head));
        assert_eq!(doc.body(), Some(body));
        assert_eq!(doc.document_element(), Some(html));
        assert_eq!(doc.get_element_by_id("content"), Some(body));
        assert_eq!(doc.style_text(), "p { color: red; }");
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::empty();
        assert!(doc.html().is_none());
        assert!(doc.tree().is_empty());
        assert_eq!(doc.title(), "");
    }
}
