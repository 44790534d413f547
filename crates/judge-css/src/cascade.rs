//! Style Cascade
//!
//! Resolves the winning declaration for a property on an element:
//! 1. Collect the rules whose selector matches the element
//! 2. Keep only `!important` declarations if there are any
//! 3. Highest specificity wins, later source order breaks ties

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use judge_dom::{Document, DomTree, NodeId, TreeId};

use crate::color::Color;
use crate::parser::CssParser;
use crate::{CssError, CssRule};

/// Winning declaration for one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    /// Serialized value as lightningcss prints it
    pub value: String,
    pub important: bool,
    /// Selector of the winning rule
    pub selector: String,
}

impl ResolvedValue {
    pub fn is_color(&self) -> bool {
        Color::parse(&self.value).is_some()
    }

    /// Does the value denote the same colour as `color`, in any notation?
    pub fn has_color(&self, color: &str) -> bool {
        match (Color::parse(&self.value), Color::parse(color)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Colour-aware, whitespace and case insensitive equality
    pub fn matches(&self, value: &str) -> bool {
        self.has_color(value) || normalize(&self.value) == normalize(value)
    }
}

fn normalize(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase()
}

/// Element -> indices of matching rules, valid for one tree
#[derive(Debug, Default)]
struct MatchCache {
    tree: Option<TreeId>,
    matches: HashMap<NodeId, Vec<usize>>,
}

/// Parsed stylesheet plus a per-tree match cache
#[derive(Debug, Default)]
pub struct CascadeEngine {
    rules: Vec<CssRule>,
    cache: RefCell<MatchCache>,
}

impl CascadeEngine {
    /// Parse a stylesheet
    pub fn parse(css: &str) -> Result<Self, CssError> {
        Ok(Self::from_rules(CssParser::new().parse(css)?))
    }

    /// Parse the contents of every `<style>` element of a document
    pub fn from_document(document: &Document) -> Result<Self, CssError> {
        Self::parse(&document.style_text())
    }

    pub fn from_rules(rules: Vec<CssRule>) -> Self {
        Self { rules, cache: RefCell::default() }
    }

    /// Flattened rules in source order
    pub fn rules(&self) -> &[CssRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve `property` on `node`.
    ///
    /// Fails with [`CssError::AmbiguousElement`] when `node` is not an
    /// element of `tree`.
    pub fn find(
        &self,
        tree: &DomTree,
        node: NodeId,
        property: &str,
    ) -> Result<Option<ResolvedValue>, CssError> {
        let property = property.to_ascii_lowercase();
        let matching = self.matching_rules(tree, node)?;
        let candidates: Vec<&CssRule> = matching
            .iter()
            .map(|&i| &self.rules[i])
            .filter(|rule| rule.property == property)
            .collect();
        Ok(resolve(candidates))
    }

    /// The winning declaration of every property that applies to `node`
    pub fn find_all(
        &self,
        tree: &DomTree,
        node: NodeId,
    ) -> Result<BTreeMap<String, ResolvedValue>, CssError> {
        let matching = self.matching_rules(tree, node)?;
        let mut by_property: BTreeMap<&str, Vec<&CssRule>> = BTreeMap::new();
        for &i in &matching {
            let rule = &self.rules[i];
            by_property.entry(rule.property.as_str()).or_default().push(rule);
        }
        Ok(by_property
            .into_iter()
            .filter_map(|(property, candidates)| {
                resolve(candidates).map(|value| (property.to_string(), value))
            })
            .collect())
    }

    /// Indices of the rules whose selector matches `node`, in source order
    fn matching_rules(&self, tree: &DomTree, node: NodeId) -> Result<Vec<usize>, CssError> {
        if tree.element(node).is_none() {
            return Err(CssError::AmbiguousElement { node });
        }

        let mut cache = self.cache.borrow_mut();
        if cache.tree != Some(tree.id()) {
            tracing::trace!(tree = ?tree.id(), "rebinding cascade cache");
            cache.tree = Some(tree.id());
            cache.matches.clear();
        }

        let matches = cache.matches.entry(node).or_insert_with(|| {
            self.rules
                .iter()
                .enumerate()
                .filter(|(_, rule)| rule.selector.matches(tree, node))
                .map(|(i, _)| i)
                .collect()
        });
        Ok(matches.clone())
    }
}

/// Pick the winner among rules for one property, given in source order
fn resolve(mut candidates: Vec<&CssRule>) -> Option<ResolvedValue> {
    if candidates.iter().any(|rule| rule.important) {
        candidates.retain(|rule| rule.important);
    }

    let mut winner = candidates.pop()?;
    for rule in candidates.into_iter().rev() {
        if rule.specificity > winner.specificity {
            winner = rule;
        }
    }

    Some(ResolvedValue {
        value: winner.value.clone(),
        important: winner.important,
        selector: winner.selector.text().to_string(),
    })
}
