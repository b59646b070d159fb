//! Codec capability interfaces.
//!
//! # Data Flow
//! ```text
//! typed value ──&dyn erased_serde::Serialize──▶ Marshaler::marshal ──▶ bytes
//! bytes ──▶ Marshaler::unmarshal ──erased Deserializer──▶ &mut dyn Target ──▶ typed value
//! FormValues ──▶ FormMarshaler::decode ──▶ &mut dyn Target
//! ```
//!
//! # Design Decisions
//! - Every capability is object-safe so codecs live behind `Arc<dyn Marshaler>`
//! - Typed values cross the trait-object boundary through `erased-serde`
//! - Optional capabilities are discovered with `as_*` queries, never downcasts
//! - Codecs are thin adapters; the wrapped format crates do the real work

pub mod form;
pub mod json;
pub mod msgpack;
pub mod multipart;
pub mod toml;
pub mod values;
pub mod xml;
pub mod yaml;

use std::fmt;
use std::io::{Read, Write};

use serde::de::DeserializeOwned;

pub use crate::error::CodecError;
pub use values::FormValues;

/// A value that can be encoded by any codec.
pub type Value<'a> = &'a dyn erased_serde::Serialize;

/// Base capability every registered codec provides.
pub trait Marshaler: Send + Sync + fmt::Debug {
    /// Content type to announce for `value`; may carry parameters such as charset.
    fn content_type(&self, value: Value<'_>) -> String;

    fn marshal(&self, value: Value<'_>) -> Result<Vec<u8>, CodecError>;

    fn unmarshal(&self, data: &[u8], target: &mut dyn Target) -> Result<(), CodecError>;

    fn new_encoder<'w>(&self, writer: Box<dyn Write + 'w>) -> Box<dyn Encoder + 'w>;

    fn new_decoder<'r>(&self, reader: Box<dyn Read + 'r>) -> Box<dyn Decoder + 'r>;

    /// Form-field decode/encode, used by the query slot.
    fn as_form(&self) -> Option<&dyn FormMarshaler> {
        None
    }

    /// URI binding and path-template encoding, used by the uri slot.
    fn as_uri(&self) -> Option<&dyn UriMarshaler> {
        None
    }

    /// Decoding from a parsed `multipart/form-data` field map.
    fn as_multipart(&self) -> Option<&dyn FormCodec> {
        None
    }
}

/// Streaming encoder bound to a writer.
pub trait Encoder {
    fn encode(&mut self, value: Value<'_>) -> Result<(), CodecError>;
}

/// Streaming decoder bound to a reader.
pub trait Decoder {
    fn decode(&mut self, target: &mut dyn Target) -> Result<(), CodecError>;
}

/// Decodes from and encodes to a field multi-map.
pub trait FormMarshaler: Marshaler {
    fn decode(&self, values: &FormValues, target: &mut dyn Target) -> Result<(), CodecError>;

    fn encode(&self, value: Value<'_>) -> Result<FormValues, CodecError>;
}

/// Form capability plus path-template expansion.
pub trait UriMarshaler: FormMarshaler {
    /// Substitute `{field}` placeholders in `template` from `value`, optionally
    /// appending the fields that were not consumed as a query string.
    fn encode_url(
        &self,
        template: &str,
        value: Value<'_>,
        include_query: bool,
    ) -> Result<String, CodecError>;
}

/// Decodes the value fields of a parsed multipart form.
pub trait FormCodec: Marshaler {
    fn decode_multipart(
        &self,
        fields: &FormValues,
        target: &mut dyn Target,
    ) -> Result<(), CodecError>;
}

/// A type-erased decode destination.
///
/// Codecs build a concrete `serde` deserializer, erase it, and hand it to
/// [`Target::fill`]; the implementor deserializes its own concrete type.
pub trait Target {
    fn fill(
        &mut self,
        deserializer: &mut dyn erased_serde::Deserializer<'_>,
    ) -> Result<(), erased_serde::Error>;
}

/// The stock [`Target`]: holds one decoded `T`.
#[derive(Debug)]
pub struct Slot<T> {
    value: Option<T>,
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Self { value: None }
    }

    pub fn into_inner(self) -> Option<T> {
        self.value
    }

    /// Take the decoded value, failing if the codec reported success
    /// without producing one.
    pub fn take(self, format: &'static str) -> Result<T, CodecError> {
        self.value
            .ok_or_else(|| CodecError::new(format, "codec produced no value"))
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> Target for Slot<T> {
    fn fill(
        &mut self,
        deserializer: &mut dyn erased_serde::Deserializer<'_>,
    ) -> Result<(), erased_serde::Error> {
        self.value = Some(erased_serde::deserialize(deserializer)?);
        Ok(())
    }
}

impl dyn Marshaler {
    /// Typed convenience over [`Marshaler::unmarshal`].
    pub fn unmarshal_as<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError> {
        let mut slot = Slot::new();
        self.unmarshal(data, &mut slot)?;
        slot.take("unmarshal")
    }

    /// Typed convenience over a one-shot streaming decode.
    pub fn decode_from<'r, T: DeserializeOwned>(
        &self,
        reader: impl Read + 'r,
    ) -> Result<T, CodecError> {
        let mut slot = Slot::new();
        self.new_decoder(Box::new(reader)).decode(&mut slot)?;
        slot.take("decode")
    }
}

/// Hand an erased deserializer to `target` and tag failures with `format`.
pub(crate) fn fill_target<'de, D>(
    format: &'static str,
    deserializer: D,
    target: &mut dyn Target,
) -> Result<(), CodecError>
where
    D: serde::Deserializer<'de>,
{
    let mut erased = <dyn erased_serde::Deserializer>::erase(deserializer);
    target
        .fill(&mut erased)
        .map_err(|e| CodecError::new(format, e))
}

/// Drain a streaming reader before handing it to a slice-based decoder.
pub(crate) fn read_all(format: &'static str, reader: &mut dyn Read) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .map_err(|e| CodecError::new(format, e))?;
    Ok(buf)
}

/// Encoder that marshals the whole value and writes it in one call.
pub(crate) struct BufferedEncoder<'w, M> {
    marshaler: M,
    writer: Box<dyn Write + 'w>,
}

impl<'w, M> BufferedEncoder<'w, M> {
    pub(crate) fn new(marshaler: M, writer: Box<dyn Write + 'w>) -> Self {
        Self { marshaler, writer }
    }
}

impl<M: Marshaler> Encoder for BufferedEncoder<'_, M> {
    fn encode(&mut self, value: Value<'_>) -> Result<(), CodecError> {
        let data = self.marshaler.marshal(value)?;
        self.writer
            .write_all(&data)
            .map_err(|e| CodecError::new("encode", e))
    }
}

/// Decoder that drains the reader and unmarshals the buffered bytes.
pub(crate) struct BufferedDecoder<'r, M> {
    marshaler: M,
    reader: Box<dyn Read + 'r>,
}

impl<'r, M> BufferedDecoder<'r, M> {
    pub(crate) fn new(marshaler: M, reader: Box<dyn Read + 'r>) -> Self {
        Self { marshaler, reader }
    }
}

impl<M: Marshaler> Decoder for BufferedDecoder<'_, M> {
    fn decode(&mut self, target: &mut dyn Target) -> Result<(), CodecError> {
        let data = read_all("decode", &mut self.reader)?;
        self.marshaler.unmarshal(&data, target)
    }
}
