//! HTML Judge
//!
//! Grades student HTML/CSS submissions for an automated judge.
//!
//! # Pipeline
//! - Delimiter and tag-structure validation with source positions
//! - Structural comparison against a reference solution
//! - Author-written checklists over the submitted document
//!
//! # Example
//! ```rust,ignore
//! use judge_engine::{Config, Judge};
//!
//! let judge = Judge::new(Config::default());
//! let submission = judge.validate(&html)?;
//! judge.compare(&solution, &html)?;
//! ```

mod config;
mod pipeline;
pub mod checks;
pub mod compare;

pub use config::Config;
pub use pipeline::{Judge, JudgeError, ValidatedSubmission};
pub use checks::{Check, CheckNode, CheckResult, ElementRef, SuiteContext, TestSuite, all_of, any_of, grouped};
pub use compare::{CompareOptions, DUMMY, Mismatch, MismatchKind};

// Re-export sub-crates for advanced usage
pub use judge_html as html;
pub use judge_css as css;
pub use judge_dom as dom;

/// Judge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
