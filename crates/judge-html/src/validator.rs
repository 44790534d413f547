//! HTML Structure Validator
//!
//! Drives the tag stream of a submission through a stack machine and stops
//! at the first fatal problem:
//! * every opened tag is closed, in order (void tags excepted)
//! * only tags from the tag table are used
//! * tags sit inside a permitted parent
//! * required attributes are present, inline styles are absent
//! * ids are unique and attribute values are usable
//!
//! Missing recommended attributes only produce warnings, reported as one
//! batch when nothing fatal was found.

use std::collections::HashSet;

use judge_dom::{Attribute, Position};
use serde::Deserialize;

use crate::delimiters::DelimiterScanner;
use crate::error::{HtmlError, RecommendedAttributeWarning, TagLocation, Warnings};
use crate::tag_spec::{TagSpec, TagSpecTable};
use crate::tokenizer::{TokenKind, Tokenizer};

/// Which checks the validator performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Required attributes must be present
    pub check_required: bool,
    /// Collect warnings for missing recommended attributes
    pub check_recommended: bool,
    /// Enforce permitted parents
    pub check_nesting: bool,
    /// Self-closing syntax only on void tags, no end tags for void tags
    pub check_void: bool,
    /// Reject `style` attributes
    pub check_inline_style: bool,
    /// Reject repeated id values
    pub check_unique_ids: bool,
    /// Reject empty ids and classes and local file paths
    pub check_attribute_values: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            check_required: true,
            check_recommended: true,
            check_nesting: true,
            check_void: true,
            check_inline_style: true,
            check_unique_ids: true,
            check_attribute_values: true,
        }
    }
}

impl ValidatorConfig {
    /// Only the structural checks (closing, legality, void syntax)
    pub fn structure_only() -> Self {
        Self {
            check_required: false,
            check_recommended: false,
            check_nesting: false,
            check_void: true,
            check_inline_style: false,
            check_unique_ids: false,
            check_attribute_values: false,
        }
    }
}

/// An open tag and where it was opened
#[derive(Debug, Clone)]
struct TagFrame {
    name: String,
    position: Position,
}

/// Stateful validator; one `validate_content` call at a time per instance
pub struct HtmlValidator<'t> {
    specs: &'t TagSpecTable,
    config: ValidatorConfig,
    stack: Vec<TagFrame>,
    warnings: Warnings,
    ids: HashSet<String>,
    delimiters: DelimiterScanner,
}

impl HtmlValidator<'static> {
    /// Validator over the bundled tag table
    pub fn new(config: ValidatorConfig) -> Self {
        Self::with_tag_specs(TagSpecTable::builtin(), config)
    }
}

impl<'t> HtmlValidator<'t> {
    pub fn with_tag_specs(specs: &'t TagSpecTable, config: ValidatorConfig) -> Self {
        Self {
            specs,
            config,
            stack: Vec::new(),
            warnings: Warnings::default(),
            ids: HashSet::new(),
            delimiters: DelimiterScanner::new(),
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ValidatorConfig) {
        self.config = config;
    }

    /// Clear all per-document state
    pub fn reset(&mut self) {
        self.stack.clear();
        self.warnings.clear();
        self.ids.clear();
        self.delimiters.reset();
    }

    /// Validate a whole document.
    ///
    /// `Err(HtmlError::Warnings(_))` means the document is structurally
    /// valid but misses recommended attributes.
    pub fn validate_content(&mut self, text: &str) -> Result<(), HtmlError> {
        self.reset();
        tracing::debug!(bytes = text.len(), "validating html");

        self.delimiters
            .validate(text)
            .map_err(HtmlError::UnbalancedDelimiters)?;

        for token in Tokenizer::new(text) {
            match token.kind {
                TokenKind::StartTag { name, attributes, self_closing: false } => {
                    self.handle_start_tag(&name, &attributes, token.position)?
                }
                TokenKind::StartTag { name, attributes, self_closing: true } => {
                    self.handle_self_closing_tag(&name, &attributes, token.position)?
                }
                TokenKind::EndTag { name } => self.handle_end_tag(&name, token.position)?,
                _ => {}
            }
        }

        if let Some(frame) = self.stack.last() {
            let error = HtmlError::MissingClosingTag {
                tag: frame.name.clone(),
                location: TagLocation::new(frame.position, self.breadcrumb()),
            };
            tracing::debug!(%error, "unclosed tag at end of document");
            return Err(error);
        }

        if !self.warnings.is_empty() {
            tracing::debug!(count = self.warnings.len(), "validation finished with warnings");
            return Err(HtmlError::Warnings(std::mem::take(&mut self.warnings)));
        }

        Ok(())
    }

    fn breadcrumb(&self) -> Vec<String> {
        self.stack.iter().map(|f| f.name.clone()).collect()
    }

    fn location(&self, position: Position) -> TagLocation {
        TagLocation::new(position, self.breadcrumb())
    }

    fn fail(&self, error: HtmlError) -> Result<(), HtmlError> {
        tracing::debug!(%error, "html validation failed");
        Err(error)
    }

    /// Look the tag up in the table; unknown tags are invalid
    fn valid_tag(&self, tag: &str, position: Position) -> Result<&'t TagSpec, HtmlError> {
        let specs = self.specs;
        specs.get(tag).ok_or_else(|| HtmlError::InvalidTag {
            tag: tag.to_string(),
            location: self.location(position),
        })
    }

    fn handle_start_tag(
        &mut self,
        tag: &str,
        attributes: &[Attribute],
        position: Position,
    ) -> Result<(), HtmlError> {
        let spec = self.valid_tag(tag, position)?;
        if self.config.check_nesting {
            self.valid_nesting(tag, spec, position)?;
        }
        if !spec.is_void {
            self.stack.push(TagFrame { name: tag.to_string(), position });
        }
        self.valid_attributes(tag, spec, attributes, position)
    }

    fn handle_self_closing_tag(
        &mut self,
        tag: &str,
        attributes: &[Attribute],
        position: Position,
    ) -> Result<(), HtmlError> {
        let spec = self.valid_tag(tag, position)?;
        if spec.is_void {
            return self.handle_start_tag(tag, attributes, position);
        }
        if self.config.check_void {
            return self.fail(HtmlError::NoSelfClosingTag {
                tag: tag.to_string(),
                location: self.location(position),
            });
        }
        self.handle_start_tag(tag, attributes, position)?;
        self.handle_end_tag(tag, position)
    }

    fn handle_end_tag(&mut self, tag: &str, position: Position) -> Result<(), HtmlError> {
        let spec = self.valid_tag(tag, position)?;
        if spec.is_void {
            if self.config.check_void {
                return self.fail(HtmlError::UnexpectedClosingTag {
                    tag: tag.to_string(),
                    location: self.location(position),
                });
            }
            return Ok(());
        }

        match self.stack.last() {
            None => self.fail(HtmlError::MissingClosingTag {
                tag: tag.to_string(),
                location: self.location(position),
            }),
            Some(top) if top.name != tag => self.fail(HtmlError::MissingClosingTag {
                tag: top.name.clone(),
                location: self.location(position),
            }),
            Some(_) => {
                self.stack.pop();
                Ok(())
            }
        }
    }

    fn valid_nesting(&self, tag: &str, spec: &TagSpec, position: Position) -> Result<(), HtmlError> {
        let Some(permitted) = &spec.permitted_parents else {
            return Ok(());
        };
        // A fragment without any parent is accepted, unless the tag must be a root
        let allowed = match self.stack.last() {
            None => true,
            Some(_) if permitted.is_empty() => false,
            Some(parent) => permitted.iter().any(|p| *p == parent.name),
        };
        if allowed {
            Ok(())
        } else {
            self.fail(HtmlError::UnexpectedTag {
                tag: tag.to_string(),
                location: self.location(position),
            })
        }
    }

    fn valid_attributes(
        &mut self,
        tag: &str,
        spec: &TagSpec,
        attributes: &[Attribute],
        position: Position,
    ) -> Result<(), HtmlError> {
        let present: HashSet<String> = attributes.iter().map(|a| a.name.to_ascii_lowercase()).collect();

        if self.config.check_inline_style && present.contains("style") {
            return self.fail(HtmlError::InvalidAttribute {
                tag: tag.to_string(),
                attribute: "style".to_string(),
                location: self.location(position),
            });
        }

        if self.config.check_required {
            let missing = missing_from(&spec.required_attributes, &present);
            if !missing.is_empty() {
                return self.fail(HtmlError::MissingRequiredAttribute {
                    tag: tag.to_string(),
                    attributes: missing,
                    location: self.location(position),
                });
            }
        }

        if self.config.check_recommended {
            let missing = missing_from(&spec.recommended_attributes, &present);
            if !missing.is_empty() {
                let warning = RecommendedAttributeWarning {
                    tag: tag.to_string(),
                    attributes: missing,
                    location: self.location(position),
                };
                tracing::debug!(%warning, "recorded warning");
                self.warnings.push(warning);
            }
        }

        if self.config.check_attribute_values {
            for attr in attributes {
                if !valid_attribute_value(&attr.name, &attr.value) {
                    return self.fail(HtmlError::InvalidAttributeValue {
                        tag: tag.to_string(),
                        attribute: attr.name.clone(),
                        value: attr.value.clone(),
                        location: self.location(position),
                    });
                }
            }
        }

        if self.config.check_unique_ids {
            if let Some(id) = attributes.iter().find(|a| a.name == "id") {
                if !self.ids.insert(id.value.clone()) {
                    return self.fail(HtmlError::DuplicateId {
                        tag: tag.to_string(),
                        id: id.value.clone(),
                        location: self.location(position),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Entries of `wanted` not in `present`, keeping the order of `wanted`
fn missing_from(wanted: &[String], present: &HashSet<String>) -> Vec<String> {
    wanted
        .iter()
        .filter(|name| !present.contains(name.as_str()))
        .cloned()
        .collect()
}

fn valid_attribute_value(name: &str, value: &str) -> bool {
    match name {
        "id" => !value.is_empty() && !value.chars().any(char::is_whitespace),
        "class" => !value.trim().is_empty(),
        "src" | "href" => !is_local_file_path(value),
        _ => true,
    }
}

/// Paths that only exist on the student's own machine
fn is_local_file_path(value: &str) -> bool {
    const LOCAL_ROOTS: [&str; 5] = ["/home/", "/users/", "/tmp/", "/mnt/", "/media/"];

    let value = value.trim().to_ascii_lowercase();
    let bytes = value.as_bytes();
    let drive_letter = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/');

    value.starts_with("file:") || drive_letter || LOCAL_ROOTS.iter().any(|root| value.starts_with(root))
}
