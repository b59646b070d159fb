//! TOML codec backed by the `toml` crate.
//!
//! Only table-shaped values (structs and maps) can be marshaled.

use std::io::{Read, Write};

use super::{
    fill_target, BufferedDecoder, BufferedEncoder, CodecError, Decoder, Encoder, Marshaler, Target,
    Value,
};

const FORMAT: &str = "toml";

#[derive(Debug, Clone, Default)]
pub struct Codec;

impl Marshaler for Codec {
    fn content_type(&self, _value: Value<'_>) -> String {
        "application/toml; charset=utf-8".to_string()
    }

    fn marshal(&self, value: Value<'_>) -> Result<Vec<u8>, CodecError> {
        ::toml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| CodecError::new(FORMAT, e))
    }

    fn unmarshal(&self, data: &[u8], target: &mut dyn Target) -> Result<(), CodecError> {
        let text = std::str::from_utf8(data).map_err(|e| CodecError::new(FORMAT, e))?;
        fill_target(FORMAT, ::toml::Deserializer::new(text), target)
    }

    fn new_encoder<'w>(&self, writer: Box<dyn Write + 'w>) -> Box<dyn Encoder + 'w> {
        Box::new(BufferedEncoder::new(self.clone(), writer))
    }

    fn new_decoder<'r>(&self, reader: Box<dyn Read + 'r>) -> Box<dyn Decoder + 'r> {
        Box::new(BufferedDecoder::new(self.clone(), reader))
    }
}
