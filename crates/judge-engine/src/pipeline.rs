//! Judge - Submission pipeline
//!
//! Delimiter scan, tag validation, parsing and stylesheet loading for one
//! submission, and the reference comparison with the configured options.

use judge_css::{CascadeEngine, CssError};
use judge_dom::Document;
use judge_html::{HtmlError, HtmlParser, HtmlValidator, TagSpecError, TagSpecTable, Warnings};

use crate::Config;
use crate::compare::{self, Mismatch};

/// A submission that passed validation
#[derive(Debug)]
pub struct ValidatedSubmission {
    pub document: Document,
    /// Cascade over the submission's `<style>` content
    pub styles: CascadeEngine,
    /// Missing recommended attributes; empty when there are none
    pub warnings: Warnings,
}

/// Grades submissions against one configuration and tag table
pub struct Judge {
    config: Config,
    tag_specs: Option<TagSpecTable>,
}

impl Judge {
    /// Create a judge using the bundled tag table
    pub fn new(config: Config) -> Self {
        tracing::debug!(?config, "judge {} initialized", crate::VERSION);
        Self { config, tag_specs: None }
    }

    /// Create a judge with a custom tag table
    pub fn with_tag_specs(config: Config, tag_specs: TagSpecTable) -> Self {
        tracing::debug!(tags = tag_specs.len(), "judge initialized with custom tag table");
        Self { config, tag_specs: Some(tag_specs) }
    }

    /// Create a judge from a JSON tag table
    pub fn from_tag_json(config: Config, json: &str) -> Result<Self, JudgeError> {
        Ok(Self::with_tag_specs(config, TagSpecTable::from_json(json)?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tag_specs(&self) -> &TagSpecTable {
        self.tag_specs.as_ref().unwrap_or_else(|| TagSpecTable::builtin())
    }

    /// Validate a submission and load its document and stylesheet
    pub fn validate(&self, text: &str) -> Result<ValidatedSubmission, JudgeError> {
        let mut validator = HtmlValidator::with_tag_specs(self.tag_specs(), self.config.validator);
        let warnings = match validator.validate_content(text) {
            Ok(()) => Warnings::default(),
            Err(HtmlError::Warnings(warnings)) => {
                for warning in warnings.iter() {
                    tracing::debug!(%warning, "keeping warning");
                }
                warnings
            }
            Err(error) => return Err(error.into()),
        };

        let document = self.parse(text);
        let styles = CascadeEngine::from_document(&document)?;
        tracing::debug!(
            nodes = document.tree().len(),
            rules = styles.rules().len(),
            warnings = warnings.len(),
            "submission validated"
        );

        Ok(ValidatedSubmission { document, styles, warnings })
    }

    /// Compare a submission against the reference solution
    pub fn compare(&self, reference: &str, submission: &str) -> Result<(), JudgeError> {
        if compare::is_empty_document(submission) {
            return Err(Mismatch::EmptySubmission.into());
        }
        let reference = self.parse(reference);
        let submission = self.parse(submission);
        compare::compare_documents(&reference, &submission, &self.config.compare)?;
        Ok(())
    }

    /// Parse without validating
    pub fn parse(&self, text: &str) -> Document {
        HtmlParser::with_tag_specs(self.tag_specs()).parse(text)
    }
}

impl Default for Judge {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Judge error
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error(transparent)]
    Html(#[from] HtmlError),

    #[error(transparent)]
    Css(#[from] CssError),

    #[error(transparent)]
    Mismatch(#[from] Mismatch),

    #[error("invalid configuration: {0}")]
    Config(#[source] serde_json::Error),

    #[error(transparent)]
    TagSpec(#[from] TagSpecError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_are_kept() {
        let judge = Judge::default();
        let submission = judge
            .validate("<!DOCTYPE html><html><head><title>t</title></head><body></body></html>")
            .expect("valid submission");
        assert!(!submission.warnings.is_empty());
        assert!(submission.document.body().is_some());
    }

    #[test]
    fn test_fatal_errors_propagate() {
        let judge = Judge::default();
        let result = judge.validate("<html lang=\"en\"><body><div></body></html>");
        assert!(matches!(result, Err(JudgeError::Html(HtmlError::MissingClosingTag { .. }))));
    }

    #[test]
    fn test_empty_submission() {
        let judge = Judge::default();
        let result = judge.compare("<p>x</p>", "  <!-- nothing -->  ");
        assert!(matches!(result, Err(JudgeError::Mismatch(Mismatch::EmptySubmission))));
    }

    #[test]
    fn test_custom_tag_table() {
        let json = r#"{ "p": { "void_tag": false }, "br": { "void_tag": true } }"#;
        let judge = Judge::from_tag_json(Config::default(), json).expect("valid table");
        assert!(judge.validate("<p>one<br>two</p>").is_ok());
        assert!(matches!(
            judge.validate("<div></div>"),
            Err(JudgeError::Html(HtmlError::InvalidTag { .. }))
        ));
        assert!(matches!(
            Judge::from_tag_json(Config::default(), "[]"),
            Err(JudgeError::TagSpec(_))
        ));
    }
}
