//! Validation errors
//!
//! Every error is a value carrying its own structured payload; turning it
//! into a localized sentence is left to the grading glue. The `Display`
//! impls give an English rendering for logs and tests.

use std::fmt;

use judge_dom::Position;

/// Taxonomy tag of a validation problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnbalancedDelimiter,
    InvalidTag,
    MissingClosingTag,
    UnexpectedClosingTag,
    NoSelfClosingTag,
    UnexpectedTag,
    InvalidAttribute,
    MissingRequiredAttribute,
    MissingRecommendedAttribute,
    DuplicateId,
    InvalidAttributeValue,
}

/// Where a tag-level problem happened: the source position plus the
/// open-tag path (root first) at that moment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLocation {
    pub position: Position,
    pub breadcrumb: Vec<String>,
}

impl TagLocation {
    pub fn new(position: Position, breadcrumb: Vec<String>) -> Self {
        Self { position, breadcrumb }
    }
}

impl fmt::Display for TagLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "located at: {}", self.position)?;
        if !self.breadcrumb.is_empty() {
            let path: Vec<String> = self.breadcrumb.iter().map(|t| format!("<{t}>")).collect();
            write!(f, " | {}", path.join(" -> "))?;
        }
        Ok(())
    }
}

/// Whether a delimiter lacks its partner before or after it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelimiterErrorKind {
    MissingOpening,
    MissingClosing,
}

impl DelimiterErrorKind {
    fn side(self) -> &'static str {
        match self {
            Self::MissingOpening => "opening",
            Self::MissingClosing => "closing",
        }
    }
}

/// One entry per line under a heading
fn render_list<T: fmt::Display>(items: &[T]) -> String {
    items.iter().map(|item| format!("\n{item}")).collect()
}

/// One unmatched delimiter (or unterminated comment marker)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Missing {} character for '{delimiter}' at {position}", .kind.side())]
pub struct DelimiterError {
    pub kind: DelimiterErrorKind,
    pub delimiter: String,
    pub position: Position,
}

/// All unmatched delimiters of one scan, sorted by position
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("Errors ({}):{}", .errors.len(), render_list(.errors))]
pub struct DelimiterErrors {
    errors: Vec<DelimiterError>,
}

impl DelimiterErrors {
    pub(crate) fn new(mut errors: Vec<DelimiterError>) -> Self {
        errors.sort_by_key(|e| e.position);
        Self { errors }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DelimiterError> {
        self.errors.iter()
    }

    pub fn first(&self) -> Option<&DelimiterError> {
        self.errors.first()
    }
}

/// A recommended attribute is missing; never fatal on its own
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Missing recommended attribute(s) for tag <{tag}>: {} ({location})", .attributes.join(", "))]
pub struct RecommendedAttributeWarning {
    pub tag: String,
    pub attributes: Vec<String>,
    pub location: TagLocation,
}

/// Warnings gathered during one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("Warnings ({}):{}", .warnings.len(), render_list(.warnings))]
pub struct Warnings {
    warnings: Vec<RecommendedAttributeWarning>,
}

impl Warnings {
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecommendedAttributeWarning> {
        self.warnings.iter()
    }

    pub(crate) fn push(&mut self, warning: RecommendedAttributeWarning) {
        self.warnings.push(warning);
    }

    pub(crate) fn clear(&mut self) {
        self.warnings.clear();
    }
}

/// Outcome of a failed HTML validation pass
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HtmlError {
    #[error("{0}")]
    UnbalancedDelimiters(DelimiterErrors),

    #[error("Invalid tag: <{tag}> ({location})")]
    InvalidTag { tag: String, location: TagLocation },

    #[error("Missing closing tag for tag <{tag}> ({location})")]
    MissingClosingTag { tag: String, location: TagLocation },

    #[error("Void tag <{tag}> cannot have a closing tag ({location})")]
    UnexpectedClosingTag { tag: String, location: TagLocation },

    #[error("Tag <{tag}> cannot be self-closing ({location})")]
    NoSelfClosingTag { tag: String, location: TagLocation },

    #[error("Unexpected tag: <{tag}> ({location})")]
    UnexpectedTag { tag: String, location: TagLocation },

    #[error("Invalid attribute for tag <{tag}>: {attribute} ({location})")]
    InvalidAttribute { tag: String, attribute: String, location: TagLocation },

    #[error("Missing required attribute(s) for tag <{tag}>: {} ({location})", .attributes.join(", "))]
    MissingRequiredAttribute { tag: String, attributes: Vec<String>, location: TagLocation },

    #[error("Duplicate id \"{id}\" on tag <{tag}> ({location})")]
    DuplicateId { tag: String, id: String, location: TagLocation },

    #[error("Invalid value \"{value}\" for attribute {attribute} of tag <{tag}> ({location})")]
    InvalidAttributeValue { tag: String, attribute: String, value: String, location: TagLocation },

    #[error("{0}")]
    Warnings(Warnings),
}

impl HtmlError {
    /// Taxonomy tag for the grading glue
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnbalancedDelimiters(_) => ErrorKind::UnbalancedDelimiter,
            Self::InvalidTag { .. } => ErrorKind::InvalidTag,
            Self::MissingClosingTag { .. } => ErrorKind::MissingClosingTag,
            Self::UnexpectedClosingTag { .. } => ErrorKind::UnexpectedClosingTag,
            Self::NoSelfClosingTag { .. } => ErrorKind::NoSelfClosingTag,
            Self::UnexpectedTag { .. } => ErrorKind::UnexpectedTag,
            Self::InvalidAttribute { .. } => ErrorKind::InvalidAttribute,
            Self::MissingRequiredAttribute { .. } => ErrorKind::MissingRequiredAttribute,
            Self::DuplicateId { .. } => ErrorKind::DuplicateId,
            Self::InvalidAttributeValue { .. } => ErrorKind::InvalidAttributeValue,
            Self::Warnings(_) => ErrorKind::MissingRecommendedAttribute,
        }
    }

    /// True when the pass found nothing worse than missing recommended attributes
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warnings(_))
    }

    /// Tag-level location, if the error has one
    pub fn location(&self) -> Option<&TagLocation> {
        match self {
            Self::InvalidTag { location, .. }
            | Self::MissingClosingTag { location, .. }
            | Self::UnexpectedClosingTag { location, .. }
            | Self::NoSelfClosingTag { location, .. }
            | Self::UnexpectedTag { location, .. }
            | Self::InvalidAttribute { location, .. }
            | Self::MissingRequiredAttribute { location, .. }
            | Self::DuplicateId { location, .. }
            | Self::InvalidAttributeValue { location, .. } => Some(location),
            Self::Warnings(w) => w.iter().next().map(|w| &w.location),
            Self::UnbalancedDelimiters(_) => None,
        }
    }

    /// Source position; aggregates report their first entry
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::UnbalancedDelimiters(errors) => errors.first().map(|e| e.position),
            other => other.location().map(|l| l.position),
        }
    }
}
