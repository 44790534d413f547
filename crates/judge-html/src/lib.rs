//! Judge HTML
//!
//! Everything the judge does with raw HTML text: the delimiter balance
//! scan, the tag-structure validator and a lenient parser that builds the
//! DOM for the comparator and the cascade engine.

mod delimiters;
mod error;
mod parser;
mod tag_spec;
mod tokenizer;
mod validator;

pub use delimiters::DelimiterScanner;
pub use error::{
    DelimiterError, DelimiterErrorKind, DelimiterErrors, ErrorKind, HtmlError,
    RecommendedAttributeWarning, TagLocation, Warnings,
};
pub use parser::HtmlParser;
pub use tag_spec::{TagSpec, TagSpecError, TagSpecTable};
pub use tokenizer::{Token, TokenKind, Tokenizer};
pub use validator::{HtmlValidator, ValidatorConfig};

use judge_dom::Document;

/// Parse an HTML string into a Document
pub fn parse(html: &str) -> Document {
    HtmlParser::new().parse(html)
}

/// Validate a submission with the bundled tag table and default checks
pub fn validate(html: &str) -> Result<(), HtmlError> {
    HtmlValidator::new(ValidatorConfig::default()).validate_content(html)
}
