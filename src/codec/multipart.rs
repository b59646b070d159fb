//! `multipart/form-data` codec.
//!
//! Value fields of a parsed multipart body decode through the wrapped form
//! codec. Marshaling writes a multipart body delimited by this codec's
//! boundary, which is also announced in the content type.

use std::io::{Read, Write};

use super::{
    form, BufferedDecoder, BufferedEncoder, CodecError, Decoder, Encoder, FormCodec,
    FormMarshaler, FormValues, Marshaler, Target, Value,
};
use crate::http::multipart::{self as parser, MultipartConfig};

const FORMAT: &str = "multipart";

/// Boundary used when none is given.
pub const DEFAULT_BOUNDARY: &str = "http-encoding-form-boundary";

#[derive(Debug, Clone)]
pub struct Codec {
    form: form::Codec,
    boundary: String,
}

impl Codec {
    pub fn new(form: form::Codec) -> Self {
        Self {
            form,
            boundary: DEFAULT_BOUNDARY.to_string(),
        }
    }

    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(form::Codec::new())
    }
}

impl Marshaler for Codec {
    fn content_type(&self, _value: Value<'_>) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    fn marshal(&self, value: Value<'_>) -> Result<Vec<u8>, CodecError> {
        let fields = self.form.encode(value)?;
        Ok(parser::write_form(&fields, &self.boundary))
    }

    fn unmarshal(&self, data: &[u8], target: &mut dyn Target) -> Result<(), CodecError> {
        let parts = parser::MultipartParser::new(&self.boundary, MultipartConfig::default())
            .parse(data)
            .map_err(|e| CodecError::new(FORMAT, e))?;
        let fields = parser::value_fields(&parts).map_err(|e| CodecError::new(FORMAT, e))?;
        self.decode_multipart(&fields, target)
    }

    fn new_encoder<'w>(&self, writer: Box<dyn Write + 'w>) -> Box<dyn Encoder + 'w> {
        Box::new(BufferedEncoder::new(self.clone(), writer))
    }

    fn new_decoder<'r>(&self, reader: Box<dyn Read + 'r>) -> Box<dyn Decoder + 'r> {
        Box::new(BufferedDecoder::new(self.clone(), reader))
    }

    fn as_multipart(&self) -> Option<&dyn FormCodec> {
        Some(self)
    }
}

impl FormCodec for Codec {
    fn decode_multipart(
        &self,
        fields: &FormValues,
        target: &mut dyn Target,
    ) -> Result<(), CodecError> {
        self.form.decode(fields, target)
    }
}
