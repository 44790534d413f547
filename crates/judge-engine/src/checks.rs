//! Check Engine
//!
//! Exercise authors describe what a submission must contain as a checklist
//! of [`Check`]s. A check is a predicate tree with a message; checks listed
//! in `on_success` only run when their parent passed, so a missing element
//! yields one message instead of one per property of that element.
//!
//! ```rust,ignore
//! let mut suite = TestSuite::new("Structure", html);
//! let table = suite.element("table", None);
//! suite.add_check(
//!     table.exists().display().then([
//!         table.has_table_content(&[&["Name", "Age"], &["Ann", "21"]]).display(),
//!     ]),
//! );
//! let results = suite.evaluate();
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use judge_css::CascadeEngine;
use judge_dom::{Document, DomTree, NodeId};

/// A predicate over the document under test
pub type Predicate = Rc<dyn Fn(&SuiteContext) -> bool>;

/// The document a suite evaluates plus its stylesheet
pub struct SuiteContext {
    pub document: Document,
    /// `None` when the document's stylesheet does not parse
    pub styles: Option<CascadeEngine>,
}

impl SuiteContext {
    pub fn new(html: &str) -> Self {
        let document = judge_html::parse(html);
        let styles = match CascadeEngine::from_document(&document) {
            Ok(engine) => Some(engine),
            Err(error) => {
                tracing::debug!(%error, "stylesheet unusable, styling checks will fail");
                None
            }
        };
        Self { document, styles }
    }

    pub fn tree(&self) -> &DomTree {
        self.document.tree()
    }
}

/// How a check decides whether it passed
#[derive(Clone)]
pub enum CheckNode {
    Predicate(Predicate),
    /// Every child (and its `on_success` chain) passes
    All(Vec<Check>),
    /// At least one child (and its `on_success` chain) passes
    Any(Vec<Check>),
}

impl fmt::Debug for CheckNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::All(checks) => f.debug_tuple("All").field(checks).finish(),
            Self::Any(checks) => f.debug_tuple("Any").field(checks).finish(),
        }
    }
}

/// One entry of a checklist
#[derive(Debug, Clone)]
pub struct Check {
    message: String,
    node: CheckNode,
    on_success: Vec<Check>,
    hidden: bool,
}

impl Check {
    /// A hidden check backed by a predicate
    pub fn new(message: impl Into<String>, predicate: impl Fn(&SuiteContext) -> bool + 'static) -> Self {
        Self::from_node(message, CheckNode::Predicate(Rc::new(predicate)))
    }

    fn from_node(message: impl Into<String>, node: CheckNode) -> Self {
        Self {
            message: message.into(),
            node,
            on_success: Vec::new(),
            hidden: true,
        }
    }

    /// Show this check's message in the checklist
    pub fn display(mut self) -> Self {
        self.hidden = false;
        self
    }

    /// Checks that only run once this one passed
    pub fn then(mut self, checks: impl IntoIterator<Item = Check>) -> Self {
        self.on_success.extend(checks);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn on_success(&self) -> &[Check] {
        &self.on_success
    }

    /// Evaluate this check's own node
    pub fn passes(&self, context: &SuiteContext) -> bool {
        match &self.node {
            CheckNode::Predicate(predicate) => predicate(context),
            CheckNode::All(checks) => checks.iter().all(|c| c.passes_with_followups(context)),
            CheckNode::Any(checks) => checks.iter().any(|c| c.passes_with_followups(context)),
        }
    }

    /// Evaluate this check and, if it passes, everything in `on_success`
    pub fn passes_with_followups(&self, context: &SuiteContext) -> bool {
        self.passes(context) && self.on_success.iter().all(|c| c.passes_with_followups(context))
    }
}

/// Passes when every check passes
pub fn all_of(message: impl Into<String>, checks: impl IntoIterator<Item = Check>) -> Check {
    Check::from_node(message, CheckNode::All(checks.into_iter().collect()))
}

/// Passes when at least one check passes
pub fn any_of(message: impl Into<String>, checks: impl IntoIterator<Item = Check>) -> Check {
    Check::from_node(message, CheckNode::Any(checks.into_iter().collect()))
}

/// A visible check that reports one message for a whole chain of checks,
/// so the checklist does not reveal which intermediate step is missing
pub fn grouped(message: impl Into<String>, checks: impl IntoIterator<Item = Check>) -> Check {
    all_of(message, checks).display()
}

/// Outcome of one visible check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
}

/// An element looked up in a suite's document; may be missing
#[derive(Clone)]
pub struct ElementRef {
    context: Rc<SuiteContext>,
    tag: String,
    id: Option<String>,
    node: Option<NodeId>,
}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("tag", &self.tag)
            .field("id", &self.id)
            .field("node", &self.node)
            .finish()
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "<{} id={}>", self.tag, id),
            None => write!(f, "<{}>", self.tag),
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl ElementRef {
    /// The matched node, if the element exists
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// First child element with `tag`, among direct children or anywhere below
    pub fn child(&self, tag: &str, direct: bool) -> ElementRef {
        let node = self
            .node
            .and_then(|parent| self.context.tree().find_child(parent, tag, direct));
        ElementRef {
            context: Rc::clone(&self.context),
            tag: tag.to_ascii_lowercase(),
            id: None,
            node,
        }
    }

    pub fn exists(&self) -> Check {
        let node = self.node;
        Check::new(format!("Element {self} is missing."), move |_| node.is_some())
    }

    pub fn has_child(&self, tag: &str, direct: bool) -> Check {
        let node = self.node;
        let child = tag.to_string();
        Check::new(
            format!("Element {self} is missing child with tag {tag}."),
            move |context| {
                node.and_then(|n| context.tree().find_child(n, &child, direct))
                    .is_some()
            },
        )
    }

    /// With `None`, any non-empty text passes
    pub fn has_content(&self, text: Option<&str>) -> Check {
        let node = self.node;
        let message = match text {
            Some(text) => format!("Content of element {self} did not match required content ({text})."),
            None => format!("Element {self} does not contain any text."),
        };
        let expected = text.map(normalize);
        Check::new(message, move |context| {
            let Some(node) = node else {
                return false;
            };
            let content = normalize(&context.tree().text_content(node));
            match &expected {
                Some(expected) => content == *expected,
                None => !content.is_empty(),
            }
        })
    }

    /// With `None`, only the presence of the attribute is checked
    pub fn has_attribute(&self, name: &str, value: Option<&str>) -> Check {
        let node = self.node;
        let attribute = name.to_string();
        let expected = value.map(str::to_string);
        let message = match value {
            Some(value) => format!("Element {self} does not have attribute {name} with value \"{value}\"."),
            None => format!("Element {self} is missing attribute {name}."),
        };
        Check::new(message, move |context| {
            let Some(actual) = node.and_then(|n| context.tree().attribute(n, &attribute)) else {
                return false;
            };
            expected.as_deref().is_none_or(|expected| actual.trim() == expected)
        })
    }

    /// With `None`, any value for `property` passes; colours compare by value
    pub fn has_styling(&self, property: &str, value: Option<&str>) -> Check {
        let node = self.node;
        let property_name = property.to_string();
        let expected = value.map(str::to_string);
        let message = match value {
            Some(value) => format!("Element {self} does not have styling {property}: {value}."),
            None => format!("Element {self} is missing styling for {property}."),
        };
        Check::new(message, move |context| {
            let (Some(node), Some(styles)) = (node, context.styles.as_ref()) else {
                return false;
            };
            match styles.find(context.tree(), node, &property_name) {
                Ok(Some(resolved)) => expected.as_deref().is_none_or(|v| resolved.matches(v)),
                Ok(None) | Err(_) => false,
            }
        })
    }

    /// The text of the `th`/`td` cells of every row, in order
    pub fn has_table_content(&self, rows: &[&[&str]]) -> Check {
        let node = self.node;
        let expected: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|cell| normalize(cell)).collect())
            .collect();
        Check::new(
            format!("Element {self} does not contain the expected table content."),
            move |context| node.is_some_and(|table| table_rows(context.tree(), table) == expected),
        )
    }
}

fn table_rows(tree: &DomTree, table: NodeId) -> Vec<Vec<String>> {
    tree.find_all(table, "tr")
        .into_iter()
        .map(|row| {
            tree.element_children(row)
                .filter(|&cell| matches!(tree.tag_name(cell), Some("th" | "td")))
                .map(|cell| normalize(&tree.text_content(cell)))
                .collect()
        })
        .collect()
}

/// A named checklist over one document
pub struct TestSuite {
    name: String,
    context: Rc<SuiteContext>,
    checklist: Vec<Check>,
}

impl TestSuite {
    pub fn new(name: impl Into<String>, html: &str) -> Self {
        Self {
            name: name.into(),
            context: Rc::new(SuiteContext::new(html)),
            checklist: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &SuiteContext {
        &self.context
    }

    /// Look an element up below `<html>`
    pub fn element(&self, tag: &str, id: Option<&str>) -> ElementRef {
        let start = self.context.document.html();
        self.lookup(start, tag, id)
    }

    /// Look an element up anywhere in the document
    pub fn element_anywhere(&self, tag: &str, id: Option<&str>) -> ElementRef {
        let start = Some(self.context.document.root());
        self.lookup(start, tag, id)
    }

    fn lookup(&self, start: Option<NodeId>, tag: &str, id: Option<&str>) -> ElementRef {
        let tree = self.context.tree();
        let node = start.and_then(|start| {
            tree.descendants(start).find(|&n| {
                tree.tag_name(n).is_some_and(|t| t.eq_ignore_ascii_case(tag))
                    && id.is_none_or(|id| tree.attribute(n, "id") == Some(id))
            })
        });
        ElementRef {
            context: Rc::clone(&self.context),
            tag: tag.to_ascii_lowercase(),
            id: id.map(str::to_string),
            node,
        }
    }

    pub fn add_check(&mut self, check: Check) {
        self.checklist.push(check);
    }

    pub fn checklist(&self) -> &[Check] {
        &self.checklist
    }

    /// Run the checklist; follow-up checks run right after a passing parent
    pub fn evaluate(&self) -> Vec<CheckResult> {
        let mut results = Vec::new();
        let mut queue: VecDeque<&Check> = self.checklist.iter().collect();

        while let Some(check) = queue.pop_front() {
            let passed = check.passes(&self.context);
            if !check.hidden {
                results.push(CheckResult { passed, message: check.message.clone() });
            }
            if passed {
                for follow_up in check.on_success.iter().rev() {
                    queue.push_front(follow_up);
                }
            }
        }

        tracing::debug!(
            suite = %self.name,
            checks = results.len(),
            failed = results.iter().filter(|r| !r.passed).count(),
            "evaluated test suite"
        );
        results
    }

    /// Number of visible checks that failed
    pub fn failed(&self) -> usize {
        self.evaluate().iter().filter(|r| !r.passed).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"<html lang="en">
<head><style>h1 { color: #ff0000 } #info td { padding: 2px }</style></head>
<body>
  <h1 class="title">Shop</h1>
  <table id="info">
    <tr><th>Item</th><th>Price</th></tr>
    <tr><td>Apple</td><td>1</td></tr>
  </table>
</body>
</html>"#;

    #[test]
    fn test_element_lookup() {
        let suite = TestSuite::new("lookup", HTML);
        assert!(suite.element("h1", None).node().is_some());
        assert!(suite.element("table", Some("info")).node().is_some());
        assert!(suite.element("table", Some("other")).node().is_none());
        // Below <html> only
        assert!(suite.element("html", None).node().is_none());
        assert!(suite.element_anywhere("html", None).node().is_some());
    }

    #[test]
    fn test_predicates() {
        let suite = TestSuite::new("predicates", HTML);
        let context = suite.context();
        let h1 = suite.element("h1", None);
        assert!(h1.exists().passes(context));
        assert!(h1.has_content(Some("Shop")).passes(context));
        assert!(h1.has_content(None).passes(context));
        assert!(h1.has_attribute("class", Some("title")).passes(context));
        assert!(!h1.has_attribute("id", None).passes(context));
        assert!(h1.has_styling("color", Some("red")).passes(context));
        assert!(!h1.has_styling("color", Some("blue")).passes(context));
        assert!(!h1.has_styling("margin", None).passes(context));

        let table = suite.element("table", Some("info"));
        assert!(table.has_child("tr", false).passes(context));
        assert!(table
            .has_table_content(&[&["Item", "Price"], &["Apple", "1"]])
            .passes(context));
        assert!(!table.has_table_content(&[&["Item", "Price"]]).passes(context));
        assert!(table.child("td", false).has_styling("padding", None).passes(context));
    }

    #[test]
    fn test_missing_element_fails_quietly() {
        let suite = TestSuite::new("missing", HTML);
        let context = suite.context();
        let nav = suite.element("nav", None);
        assert!(!nav.exists().passes(context));
        assert!(!nav.has_content(None).passes(context));
        assert!(!nav.child("a", true).exists().passes(context));
        assert_eq!(nav.exists().message(), "Element <nav> is missing.");
    }

    #[test]
    fn test_evaluate_skips_followups_of_failed_checks() {
        let mut suite = TestSuite::new("evaluate", HTML);
        let nav = suite.element("nav", None);
        let h1 = suite.element("h1", None);
        suite.add_check(nav.exists().display().then([nav.has_content(None).display()]));
        suite.add_check(h1.exists().then([h1.has_content(Some("Shop")).display()]));

        let results = suite.evaluate();
        assert_eq!(
            results,
            vec![
                CheckResult { passed: false, message: "Element <nav> is missing.".into() },
                CheckResult {
                    passed: true,
                    message: "Content of element <h1> did not match required content (Shop).".into()
                },
            ]
        );
        assert_eq!(suite.failed(), 1);
    }

    #[test]
    fn test_cloned_checks_share_predicate() {
        let suite = TestSuite::new("clone", HTML);
        let check = suite.element("h1", None).exists();
        let copy = check.clone();
        let (CheckNode::Predicate(a), CheckNode::Predicate(b)) = (&check.node, &copy.node) else {
            panic!("predicate checks expected");
        };
        assert!(Rc::ptr_eq(a, b));
        assert_eq!(Rc::strong_count(a), 2);
        assert!(copy.passes(suite.context()));
    }

    #[test]
    fn test_composition() {
        let suite = TestSuite::new("composition", HTML);
        let context = suite.context();
        let h1 = suite.element("h1", None);
        let nav = suite.element("nav", None);

        assert!(all_of("both", [h1.exists(), suite.element("table", None).exists()]).passes(context));
        assert!(!all_of("both", [h1.exists(), nav.exists()]).passes(context));
        assert!(any_of("either", [nav.exists(), h1.exists()]).passes(context));
        assert!(!any_of("either", [nav.exists()]).passes(context));

        // The failing follow-up makes the whole group fail
        let group = grouped("Heading is complete", [h1.exists().then([h1.has_content(Some("Other"))])]);
        assert!(!group.is_hidden());
        assert!(!group.passes(context));
    }
}
