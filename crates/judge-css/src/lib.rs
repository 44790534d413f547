//! Judge CSS
//!
//! Stylesheet parsing and the cascade the comparator and the checks use to
//! ask "which value does this element get for this property".

mod cascade;
mod color;
mod parser;
mod selectors;

use std::fmt;

use judge_dom::{NodeId, Position};

pub use cascade::{CascadeEngine, ResolvedValue};
pub use color::Color;
pub use parser::CssParser;
pub use selectors::{
    AttributeMatcher, AttributeSelector, Combinator, Compound, Selector, SimpleSelector,
    split_selector_list,
};

/// Parse a CSS stylesheet
pub fn parse_stylesheet(css: &str) -> Result<CascadeEngine, CssError> {
    CascadeEngine::parse(css)
}

/// One selector with one declaration
#[derive(Debug, Clone, PartialEq)]
pub struct CssRule {
    pub selector: Selector,
    /// Lowercase property name
    pub property: String,
    pub value: String,
    pub important: bool,
    pub specificity: Specificity,
    /// Start of the rule the declaration belongs to
    pub position: Position,
}

/// Selector specificity (ids, classes, types)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}

/// CSS error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CssError {
    #[error("CSS parse error{}: {message}", .position.map(|p| format!(" at {p}")).unwrap_or_default())]
    Parse {
        message: String,
        position: Option<Position>,
    },

    #[error("Unsupported selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Node {node:?} is not an element of the styled document")]
    AmbiguousElement { node: NodeId },
}
