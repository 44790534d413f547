//! Selector compiler
//!
//! Compiles the selector forms the judge supports into a matcher over the
//! arena DOM: `*`, type, `#id`, `.class`, attribute predicates, compound
//! selectors and the descendant, `>`, `+` and `~` combinators. Matching
//! runs right to left from the subject element.

use std::fmt;

use judge_dom::{DomTree, NodeId};

use crate::{CssError, Specificity};

/// How two compounds are related
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    NextSibling,
    /// `a ~ b`
    SubsequentSibling,
}

/// A simple selector inside a compound
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleSelector {
    /// Universal selector *
    Universal,
    /// Type selector (lowercase tag name)
    Type(String),
    /// ID selector #id
    Id(String),
    /// Class selector .class
    Class(String),
    /// Attribute selector [attr], [attr=value], etc.
    Attribute(AttributeSelector),
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<AttributeMatcher>,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeMatcher {
    /// [attr=value] - exact match
    Exact(String),
    /// [attr~=value] - whitespace-separated list contains
    Contains(String),
    /// [attr|=value] - exact or prefix with hyphen
    DashMatch(String),
    /// [attr^=value] - starts with
    Prefix(String),
    /// [attr$=value] - ends with
    Suffix(String),
    /// [attr*=value] - contains substring
    Substring(String),
}

impl AttributeSelector {
    /// Check if an attribute value matches
    pub fn matches(&self, value: Option<&str>) -> bool {
        let (matcher, value) = match (&self.matcher, value) {
            (_, None) => return false,
            (None, Some(_)) => return true,
            (Some(matcher), Some(value)) => (matcher, value),
        };

        let fold = |s: &str| {
            if self.case_insensitive {
                s.to_lowercase()
            } else {
                s.to_string()
            }
        };
        let value = fold(value);

        match matcher {
            AttributeMatcher::Exact(expected) => value == fold(expected),
            AttributeMatcher::Contains(expected) => {
                let expected = fold(expected);
                value.split_whitespace().any(|word| word == expected)
            }
            AttributeMatcher::DashMatch(expected) => {
                let expected = fold(expected);
                value == expected || value.starts_with(&format!("{expected}-"))
            }
            // An empty operand never matches these three
            AttributeMatcher::Prefix(expected) => {
                !expected.is_empty() && value.starts_with(&fold(expected))
            }
            AttributeMatcher::Suffix(expected) => {
                !expected.is_empty() && value.ends_with(&fold(expected))
            }
            AttributeMatcher::Substring(expected) => {
                !expected.is_empty() && value.contains(&fold(expected))
            }
        }
    }
}

/// Simple selectors that all have to match the same element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    pub parts: Vec<SimpleSelector>,
}

impl Compound {
    fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(element) = tree.element(node) else {
            return false;
        };
        self.parts.iter().all(|part| match part {
            SimpleSelector::Universal => true,
            SimpleSelector::Type(tag) => element.name.eq_ignore_ascii_case(tag),
            SimpleSelector::Id(id) => element.id.as_deref() == Some(id.as_str()),
            SimpleSelector::Class(class) => element.has_class(class),
            SimpleSelector::Attribute(attr) => attr.matches(element.get_attr(&attr.name)),
        })
    }
}

/// A compiled complex selector
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    text: String,
    /// Left to right
    compounds: Vec<Compound>,
    /// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

impl Selector {
    /// Compile one complex selector (no selector lists)
    pub fn parse(text: &str) -> Result<Self, CssError> {
        SelectorParser::new(text).parse()
    }

    /// Source text of the selector
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn compounds(&self) -> &[Compound] {
        &self.compounds
    }

    pub fn combinators(&self) -> &[Combinator] {
        &self.combinators
    }

    /// (ids, classes + attributes, types)
    pub fn specificity(&self) -> Specificity {
        let mut specificity = Specificity::default();
        for part in self.compounds.iter().flat_map(|c| c.parts.iter()) {
            match part {
                SimpleSelector::Id(_) => specificity.0 += 1,
                SimpleSelector::Class(_) | SimpleSelector::Attribute(_) => specificity.1 += 1,
                SimpleSelector::Type(_) => specificity.2 += 1,
                SimpleSelector::Universal => {}
            }
        }
        specificity
    }

    /// Does the element `node` match this selector?
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        match self.compounds.len() {
            0 => false,
            n => self.matches_at(tree, n - 1, node),
        }
    }

    fn matches_at(&self, tree: &DomTree, index: usize, node: NodeId) -> bool {
        if !self.compounds[index].matches(tree, node) {
            return false;
        }
        if index == 0 {
            return true;
        }

        let next = index - 1;
        match self.combinators[next] {
            Combinator::Child => tree
                .parent(node)
                .is_some_and(|parent| self.matches_at(tree, next, parent)),
            Combinator::Descendant => tree
                .ancestors(node)
                .any(|ancestor| self.matches_at(tree, next, ancestor)),
            Combinator::NextSibling => tree
                .prev_element_sibling(node)
                .is_some_and(|sibling| self.matches_at(tree, next, sibling)),
            Combinator::SubsequentSibling => {
                std::iter::successors(tree.prev_element_sibling(node), |&s| tree.prev_element_sibling(s))
                    .any(|sibling| self.matches_at(tree, next, sibling))
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Split a selector list on top-level commas
pub fn split_selector_list(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut escaped = false;

    for (i, ch) in list.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(list[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

struct SelectorParser<'a> {
    text: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> SelectorParser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, chars: text.trim().chars().peekable() }
    }

    fn error(&self, reason: impl Into<String>) -> CssError {
        CssError::InvalidSelector {
            selector: self.text.trim().to_string(),
            reason: reason.into(),
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
            skipped = true;
        }
        skipped
    }

    fn parse(mut self) -> Result<Selector, CssError> {
        let mut compounds = Vec::new();
        let mut combinators = Vec::new();

        loop {
            let compound = self.compound()?;
            if compound.parts.is_empty() {
                return Err(self.error("expected a selector"));
            }
            compounds.push(compound);

            let had_space = self.skip_whitespace();
            let combinator = match self.chars.peek().copied() {
                None => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_space => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{c}'"))),
            };
            if combinator != Combinator::Descendant {
                self.chars.next();
                self.skip_whitespace();
            }
            combinators.push(combinator);
        }

        Ok(Selector {
            text: self.text.trim().to_string(),
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound, CssError> {
        let mut parts = Vec::new();

        match self.chars.peek() {
            Some('*') => {
                self.chars.next();
                parts.push(SimpleSelector::Universal);
            }
            Some(&c) if is_ident_char(c) || c == '\\' => {
                parts.push(SimpleSelector::Type(self.ident()?.to_ascii_lowercase()));
            }
            _ => {}
        }

        while let Some(&c) = self.chars.peek() {
            match c {
                '#' => {
                    self.chars.next();
                    parts.push(SimpleSelector::Id(self.ident()?));
                }
                '.' => {
                    self.chars.next();
                    parts.push(SimpleSelector::Class(self.ident()?));
                }
                '[' => {
                    self.chars.next();
                    parts.push(SimpleSelector::Attribute(self.attribute()?));
                }
                ':' => return Err(self.error("pseudo-classes and pseudo-elements are not supported")),
                '|' => return Err(self.error("namespaces are not supported")),
                '*' => return Err(self.error("'*' must start a compound selector")),
                _ => break,
            }
        }

        Ok(Compound { parts })
    }

    fn ident(&mut self) -> Result<String, CssError> {
        let mut ident = String::new();
        while let Some(&c) = self.chars.peek() {
            if c == '\\' {
                self.chars.next();
                ident.push(self.escape()?);
            } else if is_ident_char(c) {
                ident.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if ident.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(ident)
    }

    fn attribute(&mut self) -> Result<AttributeSelector, CssError> {
        self.skip_whitespace();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let operator = match self.chars.next() {
            Some(']') => {
                return Ok(AttributeSelector { name, matcher: None, case_insensitive: false });
            }
            Some('=') => '=',
            Some(op @ ('~' | '|' | '^' | '$' | '*')) => {
                if self.chars.next() != Some('=') {
                    return Err(self.error(format!("expected '=' after '{op}'")));
                }
                op
            }
            _ => return Err(self.error("malformed attribute selector")),
        };

        self.skip_whitespace();
        let value = match self.chars.peek() {
            Some(&q @ ('"' | '\'')) => {
                self.chars.next();
                self.quoted(q)?
            }
            _ => self.ident()?,
        };

        self.skip_whitespace();
        let mut case_insensitive = false;
        match self.chars.next() {
            Some(']') => {}
            Some('i' | 'I') => {
                case_insensitive = true;
                self.close_attribute()?;
            }
            Some('s' | 'S') => self.close_attribute()?,
            _ => return Err(self.error("malformed attribute selector")),
        }

        let matcher = match operator {
            '=' => AttributeMatcher::Exact(value),
            '~' => AttributeMatcher::Contains(value),
            '|' => AttributeMatcher::DashMatch(value),
            '^' => AttributeMatcher::Prefix(value),
            '$' => AttributeMatcher::Suffix(value),
            _ => AttributeMatcher::Substring(value),
        };
        Ok(AttributeSelector { name, matcher: Some(matcher), case_insensitive })
    }

    fn close_attribute(&mut self) -> Result<(), CssError> {
        self.skip_whitespace();
        match self.chars.next() {
            Some(']') => Ok(()),
            _ => Err(self.error("malformed attribute selector")),
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, CssError> {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some(c) if c == quote => return Ok(value),
                Some('\\') => match self.chars.peek() {
                    // Escaped newline continues the string
                    Some('\n') => {
                        self.chars.next();
                    }
                    Some(_) => value.push(self.escape()?),
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    /// Decode the escape after a `\\`: up to six hex digits plus one
    /// optional whitespace, or any other character taken literally
    fn escape(&mut self) -> Result<char, CssError> {
        let mut hex = String::new();
        while hex.len() < 6 && self.chars.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            hex.extend(self.chars.next());
        }
        if hex.is_empty() {
            return match self.chars.next() {
                Some('\n') | None => Err(self.error("invalid escape")),
                Some(c) => Ok(c),
            };
        }
        if self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
        let code = u32::from_str_radix(&hex, 16).unwrap_or(0);
        Ok(match char::from_u32(code) {
            Some('\0') | None => char::REPLACEMENT_CHARACTER,
            Some(c) => c,
        })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;
    use judge_dom::Position;

    fn add(tree: &mut DomTree, parent: NodeId, tag: &str, attr: (&str, &str)) -> NodeId {
        let id = tree.create_element(tag, Position::START);
        if let Some(element) = tree.get_mut(id).and_then(|n| n.as_element_mut()) {
            element.set_attr(attr.0, attr.1);
        }
        tree.append_child(parent, id);
        id
    }

    fn tree() -> (DomTree, NodeId, NodeId, NodeId) {
        // <div id="main"><p class="a b"></p><span lang="en-US"></span></div>
        let mut tree = DomTree::new();
        let root = tree.root();
        let div = add(&mut tree, root, "div", ("id", "main"));
        let p = add(&mut tree, div, "p", ("class", "a b"));
        let span = add(&mut tree, div, "span", ("lang", "en-US"));
        (tree, div, p, span)
    }

    fn matches(selector: &str, tree: &DomTree, node: NodeId) -> bool {
        Selector::parse(selector).expect("valid selector").matches(tree, node)
    }

    #[test]
    fn test_simple_selectors() {
        let (tree, div, p, span) = tree();
        assert!(matches("*", &tree, div));
        assert!(matches("div", &tree, div));
        assert!(matches("DIV", &tree, div));
        assert!(matches("#main", &tree, div));
        assert!(matches("p.a.b", &tree, p));
        assert!(!matches("p.c", &tree, p));
        assert!(!matches("span", &tree, p));
        assert!(matches("[lang|=en]", &tree, span));
    }

    #[test]
    fn test_escaped_identifiers() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let numeric = add(&mut tree, root, "p", ("id", "123"));
        let colon = add(&mut tree, root, "p", ("class", "sm:big"));
        assert!(matches("#\\31 23", &tree, numeric));
        assert!(matches("#\\00003123", &tree, numeric));
        assert!(matches(".sm\\:big", &tree, colon));
        assert!(matches("[class=\"sm\\3a big\"]", &tree, colon));
        assert!(!matches("#\\31 24", &tree, numeric));
    }

    #[test]
    fn test_combinators() {
        let (tree, _, p, span) = tree();
        assert!(matches("div p", &tree, p));
        assert!(matches("#main > .a", &tree, p));
        assert!(matches("p + span", &tree, span));
        assert!(matches("p ~ span", &tree, span));
        assert!(matches("div>p+span", &tree, span));
        assert!(!matches("span + p", &tree, p));
        assert!(!matches("section p", &tree, p));
        assert!(!matches("body > div > p", &tree, p));
    }

    #[test]
    fn test_specificity() {
        let spec = |s: &str| Selector::parse(s).expect("valid").specificity();
        assert_eq!(spec("*"), Specificity(0, 0, 0));
        assert_eq!(spec("p"), Specificity(0, 0, 1));
        assert_eq!(spec(".a.b"), Specificity(0, 2, 0));
        assert_eq!(spec("div#main > p[lang]"), Specificity(1, 1, 2));
    }

    #[test]
    fn test_unsupported_selectors() {
        for selector in ["a:hover", "p::before", "svg|rect", ":not(p)", "p >", "[x", ".a*"] {
            assert!(
                matches!(Selector::parse(selector), Err(CssError::InvalidSelector { .. })),
                "{selector} should be rejected"
            );
        }
    }

    #[test]
    fn test_attribute_selector_matching() {
        let sel = |matcher, case_insensitive| AttributeSelector {
            name: "type".to_string(),
            matcher: Some(matcher),
            case_insensitive,
        };

        let exact = sel(AttributeMatcher::Exact("text".into()), false);
        assert!(exact.matches(Some("text")));
        assert!(!exact.matches(Some("TEXT")));
        assert!(!exact.matches(None));

        let exact_i = sel(AttributeMatcher::Exact("text".into()), true);
        assert!(exact_i.matches(Some("TEXT")));

        let prefix = sel(AttributeMatcher::Prefix("btn-".into()), false);
        assert!(prefix.matches(Some("btn-primary")));
        assert!(!prefix.matches(Some("button")));

        let empty = sel(AttributeMatcher::Substring(String::new()), false);
        assert!(!empty.matches(Some("anything")));
    }

    #[test]
    fn test_attribute_selector_syntax() {
        let selector = Selector::parse(r#"a[href$=".pdf" i]"#).expect("valid");
        let SimpleSelector::Attribute(attr) = &selector.compounds()[0].parts[1] else {
            panic!("expected attribute selector");
        };
        assert_eq!(attr.matcher, Some(AttributeMatcher::Suffix(".pdf".into())));
        assert!(attr.case_insensitive);
    }

    #[test]
    fn test_split_selector_list() {
        assert_eq!(split_selector_list("h1, h2"), vec!["h1", "h2"]);
        assert_eq!(split_selector_list(r#"a[title="x, y"], p"#), vec![r#"a[title="x, y"]"#, "p"]);
        assert_eq!(split_selector_list("p"), vec!["p"]);
    }
}
