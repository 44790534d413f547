//! Judge DOM - Document Object Model
//!
//! Arena-based DOM tree used by the validators, the cascade engine and the
//! structure comparator. Every node remembers the source position it was
//! parsed from so grading messages can point at a line.

mod document;
mod node;
mod tree;

use std::fmt;

pub use document::Document;
pub use node::{Attribute, ElementData, Node, NodeData};
pub use tree::{Children, Descendants, DomTree, TreeId};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this ID points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena index of this node
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Position in the source text.
///
/// Both fields are 0-based; [`fmt::Display`] renders them 1-based the way
/// students count lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Start of the document
    pub const START: Position = Position { line: 0, column: 0 };

    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// 1-based line number
    pub fn display_line(&self) -> usize {
        self.line + 1
    }

    /// 1-based column number
    pub fn display_column(&self) -> usize {
        self.column + 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} position {}", self.display_line(), self.display_column())
    }
}
