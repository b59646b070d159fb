//! JSON codec backed by `serde_json`.
//!
//! Numbers decoded into dynamic values keep `serde_json::Number`, the generic
//! numeric type, whatever the destination. `disallow_unknown_fields` rejects
//! object keys the destination type did not consume.

use std::io::{Read, Write};

use super::{fill_target, CodecError, Decoder, Encoder, Marshaler, Target, Value};

const FORMAT: &str = "json";

/// JSON codec.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    /// Fail decoding when the payload carries fields the destination ignores.
    pub disallow_unknown_fields: bool,
}

impl Codec {
    /// Codec that rejects unknown fields.
    pub fn strict() -> Self {
        Self {
            disallow_unknown_fields: true,
        }
    }

    fn decode_with<'de, D>(&self, de: D, target: &mut dyn Target) -> Result<(), CodecError>
    where
        D: serde::Deserializer<'de>,
    {
        if !self.disallow_unknown_fields {
            return fill_target(FORMAT, de, target);
        }

        let mut unknown = Vec::new();
        {
            let mut track = |path: serde_ignored::Path<'_>| unknown.push(path.to_string());
            let de = serde_ignored::Deserializer::new(de, &mut track);
            fill_target(FORMAT, de, target)?;
        }
        match unknown.first() {
            Some(field) => Err(CodecError::new(
                FORMAT,
                format!("unknown field \"{field}\""),
            )),
            None => Ok(()),
        }
    }
}

impl Marshaler for Codec {
    fn content_type(&self, _value: Value<'_>) -> String {
        "application/json; charset=utf-8".to_string()
    }

    fn marshal(&self, value: Value<'_>) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::new(FORMAT, e))
    }

    fn unmarshal(&self, data: &[u8], target: &mut dyn Target) -> Result<(), CodecError> {
        let mut de = serde_json::Deserializer::from_slice(data);
        self.decode_with(&mut de, target)?;
        de.end().map_err(|e| CodecError::new(FORMAT, e))
    }

    fn new_encoder<'w>(&self, writer: Box<dyn Write + 'w>) -> Box<dyn Encoder + 'w> {
        Box::new(JsonEncoder { writer })
    }

    fn new_decoder<'r>(&self, reader: Box<dyn Read + 'r>) -> Box<dyn Decoder + 'r> {
        Box::new(JsonDecoder {
            codec: self.clone(),
            reader,
        })
    }
}

struct JsonEncoder<'w> {
    writer: Box<dyn Write + 'w>,
}

impl Encoder for JsonEncoder<'_> {
    fn encode(&mut self, value: Value<'_>) -> Result<(), CodecError> {
        serde_json::to_writer(&mut self.writer, value).map_err(|e| CodecError::new(FORMAT, e))?;
        // One document per line, like a streaming JSON encoder.
        self.writer
            .write_all(b"\n")
            .map_err(|e| CodecError::new(FORMAT, e))
    }
}

struct JsonDecoder<'r> {
    codec: Codec,
    reader: Box<dyn Read + 'r>,
}

impl Decoder for JsonDecoder<'_> {
    fn decode(&mut self, target: &mut dyn Target) -> Result<(), CodecError> {
        let mut de = serde_json::Deserializer::from_reader(&mut self.reader);
        self.codec.decode_with(&mut de, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Slot;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestMode {
        id: String,
        name: String,
    }

    fn sample() -> TestMode {
        TestMode {
            id: "foo".into(),
            name: "bar".into(),
        }
    }

    #[test]
    fn test_content_type() {
        assert_eq!(
            Codec::default().content_type(&sample()),
            "application/json; charset=utf-8"
        );
    }

    #[test]
    fn test_marshal_field_order() {
        let bytes = Codec::default().marshal(&sample()).unwrap();
        assert_eq!(bytes, br#"{"id":"foo","name":"bar"}"#);
    }

    #[test]
    fn test_lenient_ignores_unknown_fields() {
        let mut slot = Slot::<TestMode>::new();
        Codec::default()
            .unmarshal(br#"{"id":"foo","name":"bar","extra":1}"#, &mut slot)
            .unwrap();
        assert_eq!(slot.into_inner(), Some(sample()));
    }

    #[test]
    fn test_strict_rejects_unknown_fields() {
        let mut slot = Slot::<TestMode>::new();
        let err = Codec::strict()
            .unmarshal(br#"{"id":"foo","name":"bar","extra":1}"#, &mut slot)
            .unwrap_err();
        assert!(err.to_string().contains("extra"), "{err}");
    }

    #[test]
    fn test_strict_accepts_exact_payload() {
        let mut slot = Slot::<TestMode>::new();
        Codec::strict()
            .unmarshal(br#"{"id":"foo","name":"bar"}"#, &mut slot)
            .unwrap();
        assert_eq!(slot.into_inner(), Some(sample()));
    }

    #[test]
    fn test_trailing_garbage_fails_unmarshal() {
        let mut slot = Slot::<TestMode>::new();
        assert!(Codec::default()
            .unmarshal(br#"{"id":"foo","name":"bar"} x"#, &mut slot)
            .is_err());
    }

    #[test]
    fn test_streaming_roundtrip() {
        let mut buf = Vec::new();
        Codec::default()
            .new_encoder(Box::new(&mut buf))
            .encode(&sample())
            .unwrap();

        let mut slot = Slot::<TestMode>::new();
        Codec::default()
            .new_decoder(Box::new(&buf[..]))
            .decode(&mut slot)
            .unwrap();
        assert_eq!(slot.into_inner(), Some(sample()));
    }

    #[test]
    fn test_numbers_stay_generic() {
        let mut slot = Slot::<serde_json::Value>::new();
        Codec::default()
            .unmarshal(br#"{"big":18446744073709551615,"f":1.5}"#, &mut slot)
            .unwrap();
        let value = slot.into_inner().unwrap();
        assert_eq!(value["big"].as_u64(), Some(u64::MAX));
        assert_eq!(value["f"].as_f64(), Some(1.5));
    }
}
