//! `multipart/form-data` body parsing.
//!
//! # Responsibilities
//! - Split a buffered body on its boundary into parts
//! - Parse part headers and Content-Disposition
//! - Enforce the in-memory size bound and a field-count limit
//! - Collect non-file parts into a [`FormValues`] map for form binding
//!
//! # Design Decisions
//! - Bodies are buffered whole; spilling large uploads to disk is left to the transport
//! - File parts are parsed (so the body is validated) but never bound

use std::collections::HashMap;
use std::io::Read;

use thiserror::Error;

use crate::codec::FormValues;

/// Default in-memory bound for a multipart body (32 MiB).
pub const DEFAULT_MAX_MEMORY: usize = 32 << 20;

/// Default maximum number of parts.
pub const DEFAULT_MAX_FIELDS: usize = 1000;

/// RFC 2046 caps boundaries at 70 characters.
const MAX_BOUNDARY_LEN: usize = 70;

/// Limits applied while parsing.
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    pub max_total_size: usize,
    pub max_fields: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_total_size: DEFAULT_MAX_MEMORY,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

/// Errors that can occur during multipart parsing.
#[derive(Debug, Error)]
pub enum MultipartError {
    #[error("missing boundary in multipart Content-Type")]
    MissingBoundary,
    #[error("invalid multipart boundary")]
    InvalidBoundary,
    #[error("multipart body too large: exceeds limit of {max} bytes")]
    TotalTooLarge { max: usize },
    #[error("too many fields: {count} exceeds limit of {max}")]
    TooManyFields { count: usize, max: usize },
    #[error("missing Content-Disposition header in part")]
    MissingContentDisposition,
    #[error("invalid Content-Disposition: {0}")]
    InvalidContentDisposition(&'static str),
    #[error("invalid part headers: {0}")]
    InvalidPartHeaders(&'static str),
    #[error("unexpected end of multipart data")]
    UnexpectedEof,
    #[error("field {name:?} is not valid UTF-8")]
    InvalidUtf8 { name: String },
    #[error("invalid multipart format: {0}")]
    InvalidFormat(&'static str),
    #[error("failed to read multipart body: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed multipart part.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// Validate a boundary parameter taken from a parsed Content-Type.
pub fn check_boundary(boundary: Option<&str>) -> Result<&str, MultipartError> {
    let boundary = boundary.ok_or(MultipartError::MissingBoundary)?;
    if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LEN {
        return Err(MultipartError::InvalidBoundary);
    }
    Ok(boundary)
}

/// Read at most `config.max_total_size` bytes from `reader` and parse the
/// value fields.
pub fn read_form(
    reader: &mut dyn Read,
    boundary: &str,
    config: &MultipartConfig,
) -> Result<FormValues, MultipartError> {
    let mut body = Vec::new();
    let limit = u64::try_from(config.max_total_size).unwrap_or(u64::MAX);
    reader.take(limit.saturating_add(1)).read_to_end(&mut body)?;
    if body.len() > config.max_total_size {
        return Err(MultipartError::TotalTooLarge {
            max: config.max_total_size,
        });
    }

    let parts = MultipartParser::new(boundary, config.clone()).parse(&body)?;
    value_fields(&parts)
}

/// Collect the non-file parts as field values.
pub fn value_fields(parts: &[Part]) -> Result<FormValues, MultipartError> {
    let mut values = FormValues::new();
    for part in parts.iter().filter(|part| !part.is_file()) {
        let value = std::str::from_utf8(&part.data).map_err(|_| MultipartError::InvalidUtf8 {
            name: part.name.clone(),
        })?;
        values.add(part.name.as_str(), value);
    }
    Ok(values)
}

/// Write `fields` as a multipart body delimited by `boundary`.
pub fn write_form(fields: &FormValues, boundary: &str) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields.pairs() {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", escape_quotes(name))
                .as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

fn escape_quotes(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Boundary-based multipart parser.
#[derive(Debug)]
pub struct MultipartParser {
    boundary: Vec<u8>,
    config: MultipartConfig,
}

impl MultipartParser {
    pub fn new(boundary: &str, config: MultipartConfig) -> Self {
        Self {
            boundary: format!("--{boundary}").into_bytes(),
            config,
        }
    }

    /// Parse all parts from the body.
    pub fn parse(&self, body: &[u8]) -> Result<Vec<Part>, MultipartError> {
        if body.len() > self.config.max_total_size {
            return Err(MultipartError::TotalTooLarge {
                max: self.config.max_total_size,
            });
        }

        let mut parts = Vec::new();
        // Skip the preamble.
        let mut pos = self.find_boundary_from(body, 0)?;

        loop {
            let boundary_end = pos + self.boundary.len();
            if body[boundary_end..].starts_with(b"--") {
                break;
            }
            if parts.len() >= self.config.max_fields {
                return Err(MultipartError::TooManyFields {
                    count: parts.len() + 1,
                    max: self.config.max_fields,
                });
            }

            pos = boundary_end;
            if !body[pos..].starts_with(b"\r\n") {
                return Err(MultipartError::InvalidFormat("expected CRLF after boundary"));
            }
            pos += 2;

            let (headers, header_end) = parse_part_headers(body, pos)?;
            pos = header_end;

            let disposition = headers
                .get("content-disposition")
                .ok_or(MultipartError::MissingContentDisposition)?;
            let (name, filename) = parse_content_disposition(disposition)?;

            let data_end = self.find_boundary_from(body, pos)?;
            // The CRLF before a boundary belongs to the delimiter.
            let data = if data_end >= pos + 2 && body[data_end - 2..data_end] == *b"\r\n" {
                &body[pos..data_end - 2]
            } else {
                &body[pos..data_end]
            };

            parts.push(Part {
                name,
                filename,
                content_type: headers.get("content-type").cloned(),
                data: data.to_vec(),
            });
            pos = data_end;
        }

        Ok(parts)
    }

    fn find_boundary_from(&self, data: &[u8], start: usize) -> Result<usize, MultipartError> {
        let boundary = &self.boundary;
        if data.len() < boundary.len() + 2 {
            return Err(MultipartError::UnexpectedEof);
        }

        let end = data.len() - boundary.len() + 1;
        for i in start..end {
            if !data[i..].starts_with(boundary) {
                continue;
            }
            // Boundaries start the body or a CRLF-delimited line.
            if i != 0 && (i < 2 || data[i - 2..i] != *b"\r\n") {
                continue;
            }
            let boundary_end = i + boundary.len();
            if boundary_end + 2 > data.len() {
                return Err(MultipartError::UnexpectedEof);
            }
            let suffix = &data[boundary_end..boundary_end + 2];
            if suffix != b"\r\n" && suffix != b"--" {
                continue;
            }
            return Ok(i);
        }

        Err(MultipartError::UnexpectedEof)
    }
}

fn parse_part_headers(
    data: &[u8],
    start: usize,
) -> Result<(HashMap<String, String>, usize), MultipartError> {
    let mut headers = HashMap::new();
    let mut pos = start;

    loop {
        let line_end = find_crlf(data, pos)?;
        let line = &data[pos..line_end];
        if line.is_empty() {
            return Ok((headers, line_end + 2));
        }

        let line = std::str::from_utf8(line)
            .map_err(|_| MultipartError::InvalidPartHeaders("invalid UTF-8 in header"))?;
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        pos = line_end + 2;
    }
}

fn find_crlf(data: &[u8], start: usize) -> Result<usize, MultipartError> {
    data.get(start..)
        .and_then(|rest| rest.windows(2).position(|w| w == b"\r\n"))
        .map(|offset| start + offset)
        .ok_or(MultipartError::UnexpectedEof)
}

/// Format: `form-data; name="field"; filename="file.txt"`
fn parse_content_disposition(value: &str) -> Result<(String, Option<String>), MultipartError> {
    let mut name = None;
    let mut filename = None;

    for part in value.split(';') {
        let part = part.trim();
        if part.eq_ignore_ascii_case("form-data") {
            continue;
        }
        if let Some((key, raw)) = part.split_once('=') {
            let key = key.trim();
            if key.eq_ignore_ascii_case("name") {
                name = Some(unquote(raw));
            } else if key.eq_ignore_ascii_case("filename") {
                filename = Some(unquote(raw));
            }
        }
    }

    let name = name.ok_or(MultipartError::InvalidContentDisposition("missing name parameter"))?;
    Ok((name, filename))
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    match s.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "----formboundary";

    fn body() -> Vec<u8> {
        format!(
            "preamble\r\n--{b}\r\n\
             Content-Disposition: form-data; name=\"id\"\r\n\r\n\
             foo\r\n--{b}\r\n\
             Content-Disposition: form-data; name=\"name\"\r\n\r\n\
             bar\r\n--{b}\r\n\
             Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             file body\r\n--{b}--\r\n",
            b = BOUNDARY
        )
        .into_bytes()
    }

    #[test]
    fn test_parse_parts() {
        let parts = MultipartParser::new(BOUNDARY, MultipartConfig::default())
            .parse(&body())
            .unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].name, "id");
        assert_eq!(parts[0].data, b"foo");
        assert!(parts[2].is_file());
        assert_eq!(parts[2].content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_value_fields_skip_files() {
        let values = read_form(&mut &body()[..], BOUNDARY, &MultipartConfig::default()).unwrap();
        assert_eq!(values.get("id"), Some("foo"));
        assert_eq!(values.get("name"), Some("bar"));
        assert!(!values.contains_key("upload"));
    }

    #[test]
    fn test_value_fields_reject_invalid_utf8() {
        let body = b"--XyZ\r\n\
            Content-Disposition: form-data; name=\"note\"\r\n\r\n\
            \xff\xfe\r\n--XyZ--\r\n";
        let err = read_form(&mut &body[..], "XyZ", &MultipartConfig::default()).unwrap_err();
        assert!(matches!(err, MultipartError::InvalidUtf8 { ref name } if name == "note"));
    }

    #[test]
    fn test_value_fields_keep_repeated_names() {
        let body = b"--XyZ\r\n\
            Content-Disposition: form-data; name=\"tag\"\r\n\r\n\
            a\r\n--XyZ\r\n\
            Content-Disposition: form-data; name=\"tag\"\r\n\r\n\
            b\r\n--XyZ--\r\n";
        let values = read_form(&mut &body[..], "XyZ", &MultipartConfig::default()).unwrap();
        assert_eq!(values.get_all("tag"), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_size_limit() {
        let config = MultipartConfig {
            max_total_size: 16,
            ..MultipartConfig::default()
        };
        let err = read_form(&mut &body()[..], BOUNDARY, &config).unwrap_err();
        assert!(matches!(err, MultipartError::TotalTooLarge { max: 16 }));
    }

    #[test]
    fn test_field_limit() {
        let config = MultipartConfig {
            max_fields: 1,
            ..MultipartConfig::default()
        };
        let err = MultipartParser::new(BOUNDARY, config)
            .parse(&body())
            .unwrap_err();
        assert!(matches!(err, MultipartError::TooManyFields { count: 2, max: 1 }));
    }

    #[test]
    fn test_truncated_body() {
        let body = format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"id\"\r\n\r\nfoo");
        let err = MultipartParser::new(BOUNDARY, MultipartConfig::default())
            .parse(body.as_bytes())
            .unwrap_err();
        assert!(matches!(err, MultipartError::UnexpectedEof));
    }

    #[test]
    fn test_write_then_read() {
        let mut fields = FormValues::new();
        fields.add("id", "foo");
        fields.add("tag", "a");
        fields.add("tag", "b");
        let body = write_form(&fields, BOUNDARY);
        let values = read_form(&mut &body[..], BOUNDARY, &MultipartConfig::default()).unwrap();
        assert_eq!(values, fields);
    }

    #[test]
    fn test_check_boundary() {
        assert!(matches!(check_boundary(None), Err(MultipartError::MissingBoundary)));
        assert!(matches!(check_boundary(Some("")), Err(MultipartError::InvalidBoundary)));
        assert_eq!(check_boundary(Some("abc")).unwrap(), "abc");
    }
}
