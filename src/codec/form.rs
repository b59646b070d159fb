//! `application/x-www-form-urlencoded` codec.
//!
//! # Responsibilities
//! - Decode field maps (query strings, path parameters, form bodies) into typed values
//! - Encode typed values back into field maps, flattening nested structs to dotted keys
//! - Expand `{field}` placeholders in URL path templates
//!
//! # Design Decisions
//! - Decoding uses `serde_html_form`, which coerces strings into numbers and booleans
//!   and collects repeated keys into sequences
//! - Dotted keys are not regrouped on decode; nested fields bind through
//!   `#[serde(rename = "sub.name")]` on a flat struct
//! - Encoding goes through `serde_json::Value` so nested structs can be flattened
//! - Path placeholders are percent-encoded as single segments

use std::io::{Read, Write};

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::form_urlencoded;

use super::{
    fill_target, BufferedDecoder, BufferedEncoder, CodecError, Decoder, Encoder, FormMarshaler,
    FormValues, Marshaler, Target, UriMarshaler, Value,
};

const FORMAT: &str = "form";

/// Characters escaped in a substituted path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Form codec; serves the form body, query and URI slots.
#[derive(Debug, Clone, Default)]
pub struct Codec;

impl Codec {
    pub fn new() -> Self {
        Self
    }
}

impl Marshaler for Codec {
    fn content_type(&self, _value: Value<'_>) -> String {
        "application/x-www-form-urlencoded; charset=utf-8".to_string()
    }

    fn marshal(&self, value: Value<'_>) -> Result<Vec<u8>, CodecError> {
        Ok(self.encode(value)?.encode().into_bytes())
    }

    fn unmarshal(&self, data: &[u8], target: &mut dyn Target) -> Result<(), CodecError> {
        self.decode(&FormValues::parse(data), target)
    }

    fn new_encoder<'w>(&self, writer: Box<dyn Write + 'w>) -> Box<dyn Encoder + 'w> {
        Box::new(BufferedEncoder::new(self.clone(), writer))
    }

    fn new_decoder<'r>(&self, reader: Box<dyn Read + 'r>) -> Box<dyn Decoder + 'r> {
        Box::new(BufferedDecoder::new(self.clone(), reader))
    }

    fn as_form(&self) -> Option<&dyn FormMarshaler> {
        Some(self)
    }

    fn as_uri(&self) -> Option<&dyn UriMarshaler> {
        Some(self)
    }
}

impl FormMarshaler for Codec {
    fn decode(&self, values: &FormValues, target: &mut dyn Target) -> Result<(), CodecError> {
        let encoded = values.encode();
        let de = serde_html_form::Deserializer::new(form_urlencoded::parse(encoded.as_bytes()));
        fill_target(FORMAT, de, target)
    }

    fn encode(&self, value: Value<'_>) -> Result<FormValues, CodecError> {
        let json = serde_json::to_value(value).map_err(|e| CodecError::new(FORMAT, e))?;
        Ok(FormValues::from_json(&json))
    }
}

impl UriMarshaler for Codec {
    fn encode_url(
        &self,
        template: &str,
        value: Value<'_>,
        include_query: bool,
    ) -> Result<String, CodecError> {
        let mut fields = self.encode(value)?;
        let mut path = String::with_capacity(template.len());
        let mut used = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            let Some(len) = rest[open..].find('}') else {
                break;
            };
            let key = &rest[open + 1..open + len];
            if !is_placeholder(key) {
                path.push_str(&rest[..open + len + 1]);
                rest = &rest[open + len + 1..];
                continue;
            }
            path.push_str(&rest[..open]);
            let value = fields.get(key).unwrap_or_default();
            path.extend(utf8_percent_encode(value, PATH_SEGMENT));
            used.push(key.to_string());
            rest = &rest[open + len + 1..];
        }
        path.push_str(rest);

        if !include_query {
            return Ok(path);
        }
        for key in &used {
            fields.remove(key);
        }
        let query = fields.encode();
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query);
        }
        Ok(path)
    }
}

/// Placeholder names are word characters and dots, at least one char.
fn is_placeholder(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}
