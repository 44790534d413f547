//! Tag Specification Table
//!
//! Which tags a submission may use, which of them are void, which
//! attributes they need and where they may be nested. Loaded once and
//! read-only afterwards.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Deserialize;

/// Tag table shipped with the crate: the HTML elements students may use
/// (scripting elements are left out on purpose)
const BUILTIN_JSON: &str = include_str!("../data/html_tags.json");

static BUILTIN: LazyLock<TagSpecTable> = LazyLock::new(|| {
    TagSpecTable::from_json(BUILTIN_JSON).expect("bundled tag table is valid JSON")
});

/// Error loading a tag table
#[derive(Debug, thiserror::Error)]
pub enum TagSpecError {
    #[error("invalid tag specification: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rules for one tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TagSpec {
    /// No content and no closing tag (`<meta>`, `<img>`)
    #[serde(rename = "void_tag")]
    pub is_void: bool,
    /// Missing any of these is an error, reported in this order
    pub required_attributes: Vec<String>,
    /// Missing any of these is a warning
    pub recommended_attributes: Vec<String>,
    /// `None`: nesting is not checked. `Some([])`: must be a root tag.
    /// Otherwise the parent tag has to be one of these.
    pub permitted_parents: Option<Vec<String>>,
}

/// Lookup table from lowercase tag name to its rules
#[derive(Debug, Clone, Default)]
pub struct TagSpecTable {
    tags: HashMap<String, TagSpec>,
}

impl TagSpecTable {
    /// Parse a table of the form `{ "img": { "void_tag": true, ... }, ... }`
    pub fn from_json(json: &str) -> Result<Self, TagSpecError> {
        let raw: HashMap<String, TagSpec> = serde_json::from_str(json)?;
        let tags = raw
            .into_iter()
            .map(|(name, spec)| (name.to_ascii_lowercase(), spec))
            .collect::<HashMap<_, _>>();
        tracing::debug!(tags = tags.len(), "loaded tag specification");
        Ok(Self { tags })
    }

    /// The process-wide table bundled with the crate
    pub fn builtin() -> &'static TagSpecTable {
        &BUILTIN
    }

    /// Rules for a tag, `None` if the tag is not allowed
    pub fn get(&self, tag: &str) -> Option<&TagSpec> {
        self.tags.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    /// Unknown tags are not void
    pub fn is_void(&self, tag: &str) -> bool {
        self.get(tag).is_some_and(|spec| spec.is_void)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
