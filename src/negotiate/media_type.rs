//! `Content-Type` media type parsing.
//!
//! Accepts `type/subtype` followed by `;`-delimited `key=value` parameters,
//! where a value is a token or a quoted string. The bare type and parameter
//! names are lowercased.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaTypeError {
    #[error("no media type")]
    Empty,
    #[error("expected token after slash")]
    MissingSubtype,
    #[error("invalid media type {0:?}")]
    InvalidType(String),
    #[error("invalid media parameter {0:?}")]
    InvalidParameter(String),
    #[error("duplicate parameter name {0:?}")]
    DuplicateParameter(String),
}

/// A parsed media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    essence: String,
    params: BTreeMap<String, String>,
}

impl MediaType {
    /// The lowercased `type/subtype` without parameters.
    pub fn essence(&self) -> &str {
        &self.essence
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

pub fn parse_media_type(value: &str) -> Result<MediaType, MediaTypeError> {
    let (base, mut rest) = value.split_once(';').unwrap_or((value, ""));
    let essence = base.trim().to_ascii_lowercase();
    check_essence(&essence)?;

    let mut params = BTreeMap::new();
    loop {
        rest = rest.trim_start_matches(|c: char| c == ';' || c.is_ascii_whitespace());
        if rest.is_empty() {
            break;
        }
        let (name, value, remaining) = next_param(rest)?;
        if params.contains_key(&name) {
            return Err(MediaTypeError::DuplicateParameter(name));
        }
        params.insert(name, value);
        rest = remaining;
    }

    Ok(MediaType { essence, params })
}

fn check_essence(essence: &str) -> Result<(), MediaTypeError> {
    if essence.is_empty() {
        return Err(MediaTypeError::Empty);
    }
    let (main, sub) = match essence.split_once('/') {
        Some((main, sub)) => (main, Some(sub)),
        None => (essence, None),
    };
    if !is_token(main) {
        return Err(MediaTypeError::InvalidType(essence.to_string()));
    }
    match sub {
        Some("") => Err(MediaTypeError::MissingSubtype),
        Some(sub) if !is_token(sub) => Err(MediaTypeError::InvalidType(essence.to_string())),
        _ => Ok(()),
    }
}

/// Parse `name=value` at the start of `input`; returns the remainder after
/// the value.
fn next_param(input: &str) -> Result<(String, String, &str), MediaTypeError> {
    let invalid = || MediaTypeError::InvalidParameter(input.trim().to_string());

    let (name, after) = input.split_once('=').ok_or_else(invalid)?;
    let name = name.trim();
    if !is_token(name) {
        return Err(invalid());
    }
    let after = after.trim_start();

    let (value, remaining) = if let Some(quoted) = after.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = quoted.char_indices();
        let mut end = None;
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    end = Some(i + 1);
                    break;
                }
                '\\' => match chars.next() {
                    Some((_, escaped)) => value.push(escaped),
                    None => return Err(invalid()),
                },
                _ => value.push(c),
            }
        }
        let end = end.ok_or_else(invalid)?;
        (value, &quoted[end..])
    } else {
        let len = after.find(|c: char| !is_token_char(c)).unwrap_or(after.len());
        if len == 0 {
            return Err(invalid());
        }
        (after[..len].to_string(), &after[len..])
    };

    // Only whitespace may separate a value from the next `;`.
    let remaining = remaining.trim_start();
    if !remaining.is_empty() && !remaining.starts_with(';') {
        return Err(invalid());
    }
    Ok((name.to_ascii_lowercase(), value, remaining))
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

/// RFC 2045 token characters.
fn is_token_char(c: char) -> bool {
    c.is_ascii() && !c.is_ascii_control() && !" ()<>@,;:\\\"/[]?=".contains(c)
}
