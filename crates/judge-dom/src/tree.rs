//! DOM Tree (arena-based allocation)

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{ElementData, Node, NodeData, NodeId, Position};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a tree, unique for the lifetime of the process.
///
/// Caches keyed by `NodeId` store the `TreeId` they were filled for, since
/// node IDs are only meaningful inside one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(u64);

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    id: TreeId,
    pub(crate) nodes: Vec<Node>,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            id: TreeId(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed)),
            nodes: vec![Node::new(NodeData::Document, Position::START)],
        }
    }

    /// Identity of this tree
    pub fn id(&self) -> TreeId {
        self.id
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the tree, document node included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds nothing but the document node
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: &str, position: Position) -> NodeId {
        self.push(Node::new(NodeData::Element(ElementData::new(name)), position))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str, position: Position) -> NodeId {
        self.push(Node::new(NodeData::Text(text.to_string()), position))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str, position: Position) -> NodeId {
        self.push(Node::new(NodeData::Comment(text.to_string()), position))
    }

    /// Create a detached doctype node
    pub fn create_doctype(&mut self, name: &str, position: Position) -> NodeId {
        self.push(Node::new(NodeData::Doctype { name: name.to_string() }, position))
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let prev_last = match self.get(parent) {
            Some(p) => p.last_child,
            None => return,
        };

        if let Some(c) = self.get_mut(child) {
            c.parent = parent;
            c.prev_sibling = prev_last;
            c.next_sibling = NodeId::NONE;
        }
        if prev_last.is_valid() {
            if let Some(prev) = self.get_mut(prev_last) {
                prev.next_sibling = child;
            }
        }
        if let Some(p) = self.get_mut(parent) {
            if !p.first_child.is_valid() {
                p.first_child = child;
            }
            p.last_child = child;
        }
    }

    /// Iterate over the direct children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let next = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Children { tree: self, next }
    }

    /// Direct children that are elements
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .filter(|(_, node)| node.is_element())
            .map(|(child, _)| child)
    }

    /// Pre-order iterator over all descendants (excluding `id` itself)
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let next = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Descendants { tree: self, root: id, next }
    }

    /// Parent of a node, `None` for the document node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Ancestors from the parent up to the document node
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Closest preceding sibling that is an element
    pub fn prev_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.get(id)?.prev_sibling;
        while current.is_valid() {
            let node = self.get(current)?;
            if node.is_element() {
                return Some(current);
            }
            current = node.prev_sibling;
        }
        None
    }

    /// Element data of a node
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    /// Tag name of an element node
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// Attribute value of an element node
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.get_attr(name))
    }

    /// Text of the direct text children, concatenated
    pub fn own_text(&self, id: NodeId) -> String {
        self.children(id)
            .filter_map(|(_, node)| node.as_text())
            .collect()
    }

    /// Text of all descendant text nodes, concatenated in document order
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|child| self.get(child).and_then(Node::as_text))
            .collect()
    }

    /// First descendant element with the given tag
    pub fn find_first(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(root)
            .find(|&id| self.tag_name(id).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
    }

    /// All descendant elements with the given tag, in document order
    pub fn find_all(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|&id| self.tag_name(id).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
            .collect()
    }

    /// Find a child element by tag, either among direct children or anywhere below
    pub fn find_child(&self, parent: NodeId, tag: &str, direct: bool) -> Option<NodeId> {
        if direct {
            self.element_children(parent)
                .find(|&id| self.tag_name(id).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
        } else {
            self.find_first(parent, tag)
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the direct children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.next.is_valid() {
            return None;
        }
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

/// Pre-order walk below a node, driven by the sibling links
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        let node = self.tree.get(current)?;

        if node.first_child.is_valid() {
            self.next = node.first_child;
            return Some(current);
        }

        // Climb until a node with a next sibling is found, stopping at the root
        let mut climb = current;
        self.next = NodeId::NONE;
        while climb != self.root {
            let Some(n) = self.tree.get(climb) else { break };
            if n.next_sibling.is_valid() {
                self.next = n.next_sibling;
                break;
            }
            climb = n.parent;
            if !climb.is_valid() {
                break;
            }
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId, NodeId, NodeId, NodeId) {
        // <div><p>a<b>b</b></p><span></span></div>
        let mut tree = DomTree::new();
        let div = tree.create_element("div", Position::new(0, 0));
        let p = tree.create_element("p", Position::new(0, 5));
        let a = tree.create_text("a", Position::new(0, 8));
        let b = tree.create_element("b", Position::new(0, 9));
        let b_text = tree.create_text("b", Position::new(0, 12));
        let span = tree.create_element("span", Position::new(0, 21));
        tree.append_child(tree.root(), div);
        tree.append_child(div, p);
        tree.append_child(p, a);
        tree.append_child(p, b);
        tree.append_child(b, b_text);
        tree.append_child(div, span);
        (tree, div, p, b, span)
    }

    #[test]
    fn test_descendants_pre_order() {
        let (tree, div, p, b, span) = sample();
        let tags: Vec<_> = tree
            .descendants(tree.root())
            .filter_map(|id| tree.tag_name(id))
            .collect();
        assert_eq!(tags, vec!["div", "p", "b", "span"]);

        // Walking a subtree never escapes it
        let below_p: Vec<_> = tree.descendants(p).collect();
        assert_eq!(below_p.len(), 3);
        assert!(!below_p.contains(&span));
        assert!(below_p.contains(&b));
        assert_eq!(tree.descendants(span).count(), 0);
        assert_eq!(tree.find_first(div, "span"), Some(span));
    }

    #[test]
    fn test_text_helpers() {
        let (tree, _, p, _, _) = sample();
        assert_eq!(tree.own_text(p), "a");
        assert_eq!(tree.text_content(p), "ab");
    }

    #[test]
    fn test_siblings_and_ancestors() {
        let (tree, div, p, b, span) = sample();
        assert_eq!(tree.prev_element_sibling(span), Some(p));
        assert_eq!(tree.prev_element_sibling(p), None);
        let ancestors: Vec<_> = tree.ancestors(b).collect();
        assert_eq!(ancestors, vec![p, div, NodeId::ROOT]);
    }

    #[test]
    fn test_find_child_direct() {
        let (tree, div, _, b, _) = sample();
        assert_eq!(tree.find_child(div, "b", true), None);
        assert_eq!(tree.find_child(div, "b", false), Some(b));
    }

    #[test]
    fn test_tree_ids_are_unique() {
        assert_ne!(DomTree::new().id(), DomTree::new().id());
    }
}
