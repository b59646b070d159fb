//! MessagePack codec backed by `rmp-serde`.
//!
//! Structs are written as maps keyed by field name so payloads survive field
//! reordering between peers.

use std::io::{Read, Write};

use super::{fill_target, CodecError, Decoder, Encoder, Marshaler, Target, Value};

const FORMAT: &str = "msgpack";

#[derive(Debug, Clone, Default)]
pub struct Codec;

impl Marshaler for Codec {
    fn content_type(&self, _value: Value<'_>) -> String {
        "application/x-msgpack; charset=utf-8".to_string()
    }

    fn marshal(&self, value: Value<'_>) -> Result<Vec<u8>, CodecError> {
        rmp_serde::to_vec_named(value).map_err(|e| CodecError::new(FORMAT, e))
    }

    fn unmarshal(&self, data: &[u8], target: &mut dyn Target) -> Result<(), CodecError> {
        let mut de = rmp_serde::Deserializer::from_read_ref(data);
        fill_target(FORMAT, &mut de, target)
    }

    fn new_encoder<'w>(&self, writer: Box<dyn Write + 'w>) -> Box<dyn Encoder + 'w> {
        Box::new(MsgpackEncoder { writer })
    }

    fn new_decoder<'r>(&self, reader: Box<dyn Read + 'r>) -> Box<dyn Decoder + 'r> {
        Box::new(MsgpackDecoder { reader })
    }
}

struct MsgpackEncoder<'w> {
    writer: Box<dyn Write + 'w>,
}

impl Encoder for MsgpackEncoder<'_> {
    fn encode(&mut self, value: Value<'_>) -> Result<(), CodecError> {
        rmp_serde::encode::write_named(&mut self.writer, value)
            .map_err(|e| CodecError::new(FORMAT, e))
    }
}

struct MsgpackDecoder<'r> {
    reader: Box<dyn Read + 'r>,
}

impl Decoder for MsgpackDecoder<'_> {
    fn decode(&mut self, target: &mut dyn Target) -> Result<(), CodecError> {
        let mut de = rmp_serde::Deserializer::new(&mut self.reader);
        fill_target(FORMAT, &mut de, target)
    }
}
