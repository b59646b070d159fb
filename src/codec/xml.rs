//! XML codec backed by `quick-xml`'s serde support.
//!
//! The root element is named after the serialized struct.

use std::io::{Read, Write};

use super::{
    fill_target, BufferedDecoder, BufferedEncoder, CodecError, Decoder, Encoder, Marshaler, Target,
    Value,
};

const FORMAT: &str = "xml";

#[derive(Debug, Clone, Default)]
pub struct Codec;

impl Marshaler for Codec {
    fn content_type(&self, _value: Value<'_>) -> String {
        "application/xml; charset=utf-8".to_string()
    }

    fn marshal(&self, value: Value<'_>) -> Result<Vec<u8>, CodecError> {
        quick_xml::se::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| CodecError::new(FORMAT, e))
    }

    fn unmarshal(&self, data: &[u8], target: &mut dyn Target) -> Result<(), CodecError> {
        let text = std::str::from_utf8(data).map_err(|e| CodecError::new(FORMAT, e))?;
        let mut de = quick_xml::de::Deserializer::from_str(text);
        fill_target(FORMAT, &mut de, target)
    }

    fn new_encoder<'w>(&self, writer: Box<dyn Write + 'w>) -> Box<dyn Encoder + 'w> {
        Box::new(BufferedEncoder::new(self.clone(), writer))
    }

    fn new_decoder<'r>(&self, reader: Box<dyn Read + 'r>) -> Box<dyn Decoder + 'r> {
        Box::new(BufferedDecoder::new(self.clone(), reader))
    }
}
