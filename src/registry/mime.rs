//! Well-known MIME tokens.

/// Pseudo-MIME for URL query binding.
pub const MIME_QUERY: &str = "__MIME__/QUERY";
/// Pseudo-MIME for path/URI binding.
pub const MIME_URI: &str = "__MIME__/URI";
/// Fallback for requests that match no registered MIME type.
pub const MIME_WILDCARD: &str = "*";

pub const MIME_JSON: &str = "application/json";
pub const MIME_HTML: &str = "text/html";
pub const MIME_XML: &str = "application/xml";
pub const MIME_XML2: &str = "text/xml";
pub const MIME_PLAIN: &str = "text/plain";
pub const MIME_POST_FORM: &str = "application/x-www-form-urlencoded";
pub const MIME_MULTIPART_POST_FORM: &str = "multipart/form-data";
pub const MIME_PROTOBUF: &str = "application/x-protobuf";
pub const MIME_MSGPACK: &str = "application/x-msgpack";
pub const MIME_MSGPACK2: &str = "application/msgpack";
pub const MIME_YAML: &str = "application/x-yaml";
pub const MIME_TOML: &str = "application/toml";

/// Tokens that occupy dedicated registry slots.
pub const RESERVED: [&str; 3] = [MIME_WILDCARD, MIME_QUERY, MIME_URI];

pub fn is_reserved(mime: &str) -> bool {
    RESERVED.contains(&mime)
}
