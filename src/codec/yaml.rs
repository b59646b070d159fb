//! YAML codec backed by `serde_yaml`.

use std::io::{Read, Write};

use super::{fill_target, CodecError, Decoder, Encoder, Marshaler, Target, Value};

const FORMAT: &str = "yaml";

#[derive(Debug, Clone, Default)]
pub struct Codec;

impl Marshaler for Codec {
    fn content_type(&self, _value: Value<'_>) -> String {
        "application/x-yaml; charset=utf-8".to_string()
    }

    fn marshal(&self, value: Value<'_>) -> Result<Vec<u8>, CodecError> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| CodecError::new(FORMAT, e))
    }

    fn unmarshal(&self, data: &[u8], target: &mut dyn Target) -> Result<(), CodecError> {
        fill_target(FORMAT, serde_yaml::Deserializer::from_slice(data), target)
    }

    fn new_encoder<'w>(&self, writer: Box<dyn Write + 'w>) -> Box<dyn Encoder + 'w> {
        Box::new(YamlEncoder { writer })
    }

    fn new_decoder<'r>(&self, reader: Box<dyn Read + 'r>) -> Box<dyn Decoder + 'r> {
        Box::new(YamlDecoder { reader })
    }
}

struct YamlEncoder<'w> {
    writer: Box<dyn Write + 'w>,
}

impl Encoder for YamlEncoder<'_> {
    fn encode(&mut self, value: Value<'_>) -> Result<(), CodecError> {
        serde_yaml::to_writer(&mut self.writer, value).map_err(|e| CodecError::new(FORMAT, e))
    }
}

struct YamlDecoder<'r> {
    reader: Box<dyn Read + 'r>,
}

impl Decoder for YamlDecoder<'_> {
    fn decode(&mut self, target: &mut dyn Target) -> Result<(), CodecError> {
        fill_target(
            FORMAT,
            serde_yaml::Deserializer::from_reader(&mut self.reader),
            target,
        )
    }
}
