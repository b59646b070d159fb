//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0)
//! - Detect empty and duplicate MIME registrations
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EncodingConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::EncodingConfig;

const LOG_FORMATS: [&str; 2] = ["pretty", "json"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &EncodingConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.max_multipart_memory == 0 {
        errors.push(ValidationError::new(
            "max_multipart_memory",
            "must be greater than 0",
        ));
    }
    if config.max_body_bytes == 0 {
        errors.push(ValidationError::new("max_body_bytes", "must be greater than 0"));
    }

    let mut seen = HashSet::new();
    for (i, entry) in config.codecs.iter().enumerate() {
        let field = format!("codecs[{i}].mime");
        if entry.mime.is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        } else if !seen.insert(entry.mime.as_str()) {
            errors.push(ValidationError::new(
                field,
                format!("duplicate registration for {:?}", entry.mime),
            ));
        }
    }

    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        errors.push(ValidationError::new(
            "logging.format",
            format!("unknown format {:?}, expected pretty or json", config.logging.format),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{CodecEntry, CodecKind};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EncodingConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EncodingConfig {
            max_multipart_memory: 0,
            max_body_bytes: 0,
            ..EncodingConfig::default()
        };
        config.logging.format = "xml".to_string();
        config.codecs = vec![
            CodecEntry {
                mime: String::new(),
                codec: CodecKind::Json,
            },
            CodecEntry {
                mime: "text/yaml".to_string(),
                codec: CodecKind::Yaml,
            },
            CodecEntry {
                mime: "text/yaml".to_string(),
                codec: CodecKind::Yaml,
            },
        ];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "max_multipart_memory",
                "max_body_bytes",
                "codecs[0].mime",
                "codecs[2].mime",
                "logging.format",
            ]
        );
    }
}
