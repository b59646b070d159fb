//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::http::extract::DEFAULT_MAX_BODY_BYTES;
use crate::http::multipart::DEFAULT_MAX_MEMORY;

/// Root configuration for an [`Encoding`](crate::Encoding) registry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// In-memory bound for `multipart/form-data` bodies, in bytes.
    pub max_multipart_memory: usize,

    /// Bound the axum extractor applies to other request bodies, in bytes.
    pub max_body_bytes: usize,

    /// Register XML, MessagePack, YAML and TOML on top of the defaults.
    pub register_all_formats: bool,

    /// Extra registrations, applied in order after the defaults.
    pub codecs: Vec<CodecEntry>,

    pub logging: LoggingConfig,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            max_multipart_memory: DEFAULT_MAX_MEMORY,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            register_all_formats: false,
            codecs: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

/// One `mime → codec` registration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CodecEntry {
    /// MIME token, including the reserved `*`, `__MIME__/QUERY` and `__MIME__/URI`.
    pub mime: String,
    pub codec: CodecKind,
}

/// Built-in codecs selectable from configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    /// JSON, unknown fields allowed.
    Json,
    /// JSON, unknown fields rejected.
    JsonStrict,
    Form,
    Multipart,
    Xml,
    Yaml,
    Toml,
    Msgpack,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence.
    pub level: String,

    /// Output format: "pretty" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
