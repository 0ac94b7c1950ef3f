//! Tunable thresholds for the extraction pipeline.
//!
//! Every geometric cutoff lives here so documents with other page sizes can be
//! handled from a `quizpdf.toml` file instead of a code change. Missing keys
//! fall back to the values tuned for A4-ish quiz documents.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::HorizontalMatch;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub page_numbers: PageNumberFilter,
    pub underline: UnderlineRules,
    pub patterns: Patterns,
}

/// Margin bands used to recognise standalone page numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageNumberFilter {
    /// A span whose top edge is above this line is in the top band.
    pub top_margin: f32,
    /// A span whose bottom edge is below this line is in the bottom band.
    pub bottom_edge: f32,
    /// Page numbers are narrower than this.
    pub max_width: f32,
    pub max_digits: usize,
}

impl Default for PageNumberFilter {
    fn default() -> Self {
        Self {
            top_margin: 100.0,
            bottom_edge: 750.0,
            max_width: 50.0,
            max_digits: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderlineRules {
    /// Filled rectangles at least this tall are boxes, not underlines.
    pub max_height: f32,
    /// Allowed distance between an underline and the text's bottom edge.
    pub vertical_tolerance: f32,
    pub horizontal: HorizontalMatch,
}

impl Default for UnderlineRules {
    fn default() -> Self {
        Self {
            max_height: 2.0,
            vertical_tolerance: 3.0,
            horizontal: HorizontalMatch::Cover,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patterns {
    /// Word that introduces a question, followed by whitespace and its number.
    pub question_keyword: String,
}

impl Default for Patterns {
    fn default() -> Self {
        Self {
            question_keyword: "Câu".to_string(),
        }
    }
}

impl ExtractionConfig {
    /// Parse a TOML document and validate the result.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: ExtractionConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive: [(&'static str, f32); 4] = [
            ("page_numbers.top_margin", self.page_numbers.top_margin),
            ("page_numbers.max_width", self.page_numbers.max_width),
            ("underline.max_height", self.underline.max_height),
            ("underline.vertical_tolerance", self.underline.vertical_tolerance),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("expected a positive number, got {value}"),
                });
            }
        }
        if !self.page_numbers.bottom_edge.is_finite() {
            return Err(ConfigError::Invalid {
                field: "page_numbers.bottom_edge",
                reason: "must be finite".to_string(),
            });
        }
        if self.page_numbers.max_digits == 0 {
            return Err(ConfigError::Invalid {
                field: "page_numbers.max_digits",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.patterns.question_keyword.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "patterns.question_keyword",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.page_numbers.top_margin, 100.0);
        assert_eq!(config.page_numbers.bottom_edge, 750.0);
        assert_eq!(config.page_numbers.max_width, 50.0);
        assert_eq!(config.page_numbers.max_digits, 3);
        assert_eq!(config.underline.max_height, 2.0);
        assert_eq!(config.underline.vertical_tolerance, 3.0);
        assert_eq!(config.underline.horizontal, HorizontalMatch::Cover);
        assert_eq!(config.patterns.question_keyword, "Câu");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ExtractionConfig::from_toml_str("").unwrap();
        assert_eq!(config, ExtractionConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = ExtractionConfig::from_toml_str(
            r#"
            [page_numbers]
            bottom_edge = 1000.0

            [underline]
            horizontal = "overlap"
            "#,
        )
        .unwrap();
        assert_eq!(config.page_numbers.bottom_edge, 1000.0);
        assert_eq!(config.page_numbers.top_margin, 100.0);
        assert_eq!(config.underline.horizontal, HorizontalMatch::Overlap);
        assert_eq!(config.underline.vertical_tolerance, 3.0);
    }

    #[test]
    fn test_keyword_override() {
        let config = ExtractionConfig::from_toml_str(
            r#"
            [patterns]
            question_keyword = "Question"
            "#,
        )
        .unwrap();
        assert_eq!(config.patterns.question_keyword, "Question");
    }

    #[test]
    fn test_rejects_negative_tolerance() {
        let err = ExtractionConfig::from_toml_str(
            r#"
            [underline]
            vertical_tolerance = -1.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "underline.vertical_tolerance",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_zero_digits() {
        let mut config = ExtractionConfig::default();
        config.page_numbers.max_digits = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_blank_keyword() {
        let mut config = ExtractionConfig::default();
        config.patterns.question_keyword = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = ExtractionConfig::from_toml_str("[underline\nmax_height = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
