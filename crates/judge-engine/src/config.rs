//! Judge Configuration

use judge_html::ValidatorConfig;
use serde::Deserialize;

use crate::compare::CompareOptions;
use crate::pipeline::JudgeError;

/// Judge configuration options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which validator rules run on a submission
    pub validator: ValidatorConfig,

    /// Strictness of the reference comparison
    pub compare: CompareOptions,
}

impl Config {
    /// Read a configuration fragment; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, JudgeError> {
        serde_json::from_str(json).map_err(JudgeError::Config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            validator: ValidatorConfig::default(),
            compare: CompareOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.validator.check_nesting);
        assert!(config.compare.css);
        assert!(!config.compare.attributes);
    }

    #[test]
    fn test_partial_json() {
        let config = Config::from_json(r#"{ "compare": { "attributes": true }, "validator": { "check_void": false } }"#)
            .expect("valid config");
        assert!(config.compare.attributes);
        assert!(config.compare.css);
        assert!(!config.validator.check_void);
        assert!(config.validator.check_required);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(Config::from_json("{ nope"), Err(JudgeError::Config(_))));
        assert!(matches!(
            Config::from_json(r#"{ "compare": { "css": "yes" } }"#),
            Err(JudgeError::Config(_))
        ));
    }
}
