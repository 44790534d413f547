//! Tree Comparator
//!
//! Walks a reference document and a submission side by side and stops at
//! the first place where they diverge. What counts as a divergence is
//! controlled by [`CompareOptions`]; tag names and child counts are always
//! compared.

use std::collections::{HashMap, HashSet};

use judge_css::CascadeEngine;
use judge_dom::{Document, DomTree, ElementData, NodeId};
use serde::Deserialize;

/// Reference value meaning "anything goes here"
pub const DUMMY: &str = "DUMMY";

/// Which aspects of the two trees have to agree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Exactly the same attributes with the same values
    pub attributes: bool,
    /// At least the reference attributes, extra ones allowed
    pub minimal_attributes: bool,
    /// Same text inside every element
    pub contents: bool,
    /// Same resolved styles, if the reference has a stylesheet
    pub css: bool,
    /// Comments are compared like elements
    pub comments: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            attributes: false,
            minimal_attributes: false,
            contents: false,
            css: true,
            comments: false,
        }
    }
}

/// Taxonomy tag of a [`Mismatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MismatchKind {
    EmptySubmission,
    TagsDiffer,
    AttributesDiffer,
    NotAllAttributesPresent,
    ContentsDiffer,
    StylesDiffer,
    AmountChildrenDiffer,
    ExpectedComment,
    CommentsDiffer,
}

/// First divergence between reference and submission.
///
/// Lines are 0-based and refer to the submission; messages show them 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Mismatch {
    #[error("The submission is empty")]
    EmptySubmission,

    #[error("Expected tag <{expected}> but found <{found}> at line {}", .line + 1)]
    TagsDiffer { expected: String, found: String, line: usize },

    #[error("The attributes of <{tag}> differ from the expected ones at line {}", .line + 1)]
    AttributesDiffer { tag: String, line: usize },

    #[error("Not all expected attributes of <{tag}> are present at line {}", .line + 1)]
    NotAllAttributesPresent { tag: String, line: usize },

    #[error("The content of <{tag}> differs from the expected content at line {}", .line + 1)]
    ContentsDiffer { tag: String, line: usize },

    #[error("The styling of <{tag}> ({property}) differs from the expected styling at line {}", .line + 1)]
    StylesDiffer { tag: String, property: String, line: usize },

    #[error("<{tag}> has {found} children instead of {expected} at line {}", .line + 1)]
    AmountChildrenDiffer { tag: String, expected: usize, found: usize, line: usize },

    #[error("Expected a comment at line {}", .line + 1)]
    ExpectedComment { line: usize },

    #[error("The comment does not have the expected text at line {}", .line + 1)]
    CommentsDiffer { line: usize },
}

impl Mismatch {
    pub fn kind(&self) -> MismatchKind {
        match self {
            Self::EmptySubmission => MismatchKind::EmptySubmission,
            Self::TagsDiffer { .. } => MismatchKind::TagsDiffer,
            Self::AttributesDiffer { .. } => MismatchKind::AttributesDiffer,
            Self::NotAllAttributesPresent { .. } => MismatchKind::NotAllAttributesPresent,
            Self::ContentsDiffer { .. } => MismatchKind::ContentsDiffer,
            Self::StylesDiffer { .. } => MismatchKind::StylesDiffer,
            Self::AmountChildrenDiffer { .. } => MismatchKind::AmountChildrenDiffer,
            Self::ExpectedComment { .. } => MismatchKind::ExpectedComment,
            Self::CommentsDiffer { .. } => MismatchKind::CommentsDiffer,
        }
    }

    /// 0-based submission line, `None` for whole-document problems
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::EmptySubmission => None,
            Self::TagsDiffer { line, .. }
            | Self::AttributesDiffer { line, .. }
            | Self::NotAllAttributesPresent { line, .. }
            | Self::ContentsDiffer { line, .. }
            | Self::StylesDiffer { line, .. }
            | Self::AmountChildrenDiffer { line, .. }
            | Self::ExpectedComment { line }
            | Self::CommentsDiffer { line } => Some(*line),
        }
    }
}

/// Compare two HTML sources
pub fn compare(reference: &str, submission: &str, options: &CompareOptions) -> Result<(), Mismatch> {
    if is_empty_document(submission) {
        return Err(Mismatch::EmptySubmission);
    }
    let reference = judge_html::parse(reference);
    let submission = judge_html::parse(submission);
    compare_documents(&reference, &submission, options)
}

/// Compare two parsed documents
pub fn compare_documents(
    reference: &Document,
    submission: &Document,
    options: &CompareOptions,
) -> Result<(), Mismatch> {
    let styles = if options.css {
        stylesheets(reference, submission)
    } else {
        None
    };

    let comparator = TreeComparator {
        reference: reference.tree(),
        submission: submission.tree(),
        options,
        styles: styles.as_ref(),
    };
    let result = comparator.run();
    match &result {
        Ok(()) => tracing::debug!("submission matches reference"),
        Err(mismatch) => tracing::debug!(%mismatch, "submission differs from reference"),
    }
    result
}

/// Whether a submission has nothing to grade.
///
/// Besides empty and whitespace-only text this also counts a document that
/// holds nothing but comments (for example an untouched exercise template),
/// since such a submission has no elements to compare. An unterminated
/// comment swallows the rest of the text.
pub fn is_empty_document(text: &str) -> bool {
    let mut rest = text.trim();
    while let Some(comment) = rest.strip_prefix("<!--") {
        match comment.find("-->") {
            Some(end) => rest = comment[end + 3..].trim_start(),
            None => return true,
        }
    }
    rest.is_empty()
}

/// Both stylesheets, or `None` when the css comparison does not apply
fn stylesheets(reference: &Document, submission: &Document) -> Option<(CascadeEngine, CascadeEngine)> {
    let parsed = CascadeEngine::from_document(reference)
        .and_then(|expected| Ok((expected, CascadeEngine::from_document(submission)?)));
    match parsed {
        Ok((expected, _)) if expected.is_empty() => {
            tracing::debug!("reference has no css rules, css comparison disabled");
            None
        }
        Ok(engines) => Some(engines),
        Err(error) => {
            tracing::debug!(%error, "css comparison disabled");
            None
        }
    }
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct TreeComparator<'a> {
    reference: &'a DomTree,
    submission: &'a DomTree,
    options: &'a CompareOptions,
    styles: Option<&'a (CascadeEngine, CascadeEngine)>,
}

impl TreeComparator<'_> {
    fn run(&self) -> Result<(), Mismatch> {
        let mut stack = vec![(self.reference.root(), self.submission.root())];

        while let Some((expected, found)) = stack.pop() {
            let line = self.submission.get(found).map(|n| n.position.line).unwrap_or(0);

            if self.options.comments {
                if let Some(text) = self.reference.get(expected).and_then(|n| n.as_comment()) {
                    self.compare_comments(text, found, line)?;
                    continue;
                }
            }

            let expected_tag = self.reference.tag_name(expected);
            let found_tag = self.submission.tag_name(found);
            if expected_tag != found_tag {
                return Err(Mismatch::TagsDiffer {
                    expected: expected_tag.unwrap_or("#document").to_string(),
                    found: found_tag.unwrap_or("#comment").to_string(),
                    line,
                });
            }

            if let (Some(a), Some(b)) = (self.reference.element(expected), self.submission.element(found)) {
                self.compare_element(a, b, line)?;
                self.compare_contents(expected, found, &b.name, line)?;
                self.compare_styles(expected, found, &b.name, line)?;
            }

            let expected_children = self.children(self.reference, expected);
            let found_children = self.children(self.submission, found);
            if expected_children.len() != found_children.len() {
                return Err(Mismatch::AmountChildrenDiffer {
                    tag: found_tag.unwrap_or("#document").to_string(),
                    expected: expected_children.len(),
                    found: found_children.len(),
                    line,
                });
            }

            // Reversed so the leftmost pair is popped first
            stack.extend(expected_children.into_iter().zip(found_children).rev());
        }

        Ok(())
    }

    fn children(&self, tree: &DomTree, id: NodeId) -> Vec<NodeId> {
        tree.children(id)
            .filter(|(_, node)| node.is_element() || (self.options.comments && node.is_comment()))
            .map(|(child, _)| child)
            .collect()
    }

    fn compare_comments(&self, expected: &str, found: NodeId, line: usize) -> Result<(), Mismatch> {
        let Some(text) = self.submission.get(found).and_then(|n| n.as_comment()) else {
            return Err(Mismatch::ExpectedComment { line });
        };
        let expected = normalize_text(expected).to_lowercase();
        if expected != DUMMY.to_lowercase() && expected != normalize_text(text).to_lowercase() {
            return Err(Mismatch::CommentsDiffer { line });
        }
        Ok(())
    }

    fn compare_element(&self, expected: &ElementData, found: &ElementData, line: usize) -> Result<(), Mismatch> {
        if self.options.attributes && !attributes_match(expected, found, true) {
            return Err(Mismatch::AttributesDiffer { tag: found.name.clone(), line });
        }
        if self.options.minimal_attributes && !attributes_match(expected, found, false) {
            return Err(Mismatch::NotAllAttributesPresent { tag: found.name.clone(), line });
        }
        Ok(())
    }

    fn compare_contents(&self, expected: NodeId, found: NodeId, tag: &str, line: usize) -> Result<(), Mismatch> {
        if !self.options.contents {
            return Ok(());
        }
        let expected = normalize_text(&self.reference.own_text(expected));
        if expected != DUMMY && expected != normalize_text(&self.submission.own_text(found)) {
            return Err(Mismatch::ContentsDiffer { tag: tag.to_string(), line });
        }
        Ok(())
    }

    fn compare_styles(&self, expected: NodeId, found: NodeId, tag: &str, line: usize) -> Result<(), Mismatch> {
        let Some((reference_css, submission_css)) = self.styles else {
            return Ok(());
        };
        let expected_styles = reference_css.find_all(self.reference, expected).unwrap_or_default();
        if expected_styles.is_empty() {
            return Ok(());
        }
        let found_styles = submission_css.find_all(self.submission, found).unwrap_or_default();

        for (property, value) in &expected_styles {
            let same = found_styles
                .get(property)
                .is_some_and(|found| value.matches(&found.value));
            if !same {
                return Err(Mismatch::StylesDiffer {
                    tag: tag.to_string(),
                    property: property.clone(),
                    line,
                });
            }
        }
        Ok(())
    }
}

/// Does `found` carry the attributes of `expected`?
///
/// `DUMMY` values only require presence. With `exact`, `found` may not
/// have attributes beyond those of `expected`.
fn attributes_match(expected: &ElementData, found: &ElementData, exact: bool) -> bool {
    let mut dummies: HashSet<&str> = HashSet::new();
    let mut values: HashMap<&str, &str> = HashMap::new();
    for attr in &expected.attrs {
        let value = attr.value.trim();
        if value == DUMMY {
            dummies.insert(&attr.name);
        } else {
            values.insert(&attr.name, value);
        }
    }

    for attr in &found.attrs {
        let name = attr.name.as_str();
        let matched = if values.get(name) == Some(&attr.value.trim()) {
            values.remove(name).is_some()
        } else {
            dummies.remove(name)
        };
        if !matched && exact {
            return false;
        }
    }

    dummies.is_empty() && values.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(attrs: &[(&str, &str)]) -> ElementData {
        let mut element = ElementData::new("p");
        for (name, value) in attrs {
            element.set_attr(name, value);
        }
        element
    }

    #[test]
    fn test_attributes_match_exact() {
        let expected = element(&[("lang", "en"), ("id", DUMMY)]);
        assert!(attributes_match(&expected, &element(&[("lang", "en"), ("id", "x")]), true));
        assert!(!attributes_match(&expected, &element(&[("lang", "nl"), ("id", "x")]), true));
        assert!(!attributes_match(&expected, &element(&[("lang", "en")]), true));
        assert!(!attributes_match(&expected, &element(&[("lang", "en"), ("id", "x"), ("class", "c")]), true));
    }

    #[test]
    fn test_attributes_match_minimal() {
        let expected = element(&[("lang", "en")]);
        assert!(attributes_match(&expected, &element(&[("lang", "en"), ("extra", "x")]), false));
        assert!(!attributes_match(&expected, &element(&[("extra", "x")]), false));
        assert!(attributes_match(&element(&[]), &element(&[("extra", "x")]), false));
    }

    #[test]
    fn test_is_empty_document() {
        assert!(is_empty_document(""));
        assert!(is_empty_document("  \n\t "));
        assert!(is_empty_document("<!-- just a note -->\n<!-- another -->"));
        assert!(!is_empty_document("<!-- note --><p></p>"));
        assert!(!is_empty_document("text"));
        assert!(is_empty_document("<!-- <p>never closed</p>"));
        assert!(!is_empty_document("<!-- a --> <!-- b --> x"));
    }

    #[test]
    fn test_mismatch_lines() {
        assert_eq!(Mismatch::EmptySubmission.line(), None);
        let mismatch = Mismatch::TagsDiffer { expected: "th".into(), found: "td".into(), line: 4 };
        assert_eq!(mismatch.line(), Some(4));
        assert_eq!(mismatch.kind(), MismatchKind::TagsDiffer);
        assert_eq!(mismatch.to_string(), "Expected tag <th> but found <td> at line 5");
    }
}
