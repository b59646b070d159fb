//! The [`Encoding`] registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::mime::{
    MIME_JSON, MIME_MSGPACK, MIME_MSGPACK2, MIME_MULTIPART_POST_FORM, MIME_POST_FORM, MIME_QUERY,
    MIME_TOML, MIME_URI, MIME_WILDCARD, MIME_XML, MIME_XML2, MIME_YAML,
};
use crate::codec::{form, json, msgpack, multipart, toml, xml, yaml};
use crate::codec::{FormMarshaler, Marshaler, UriMarshaler};
use crate::config::schema::{CodecKind, EncodingConfig};
use crate::error::Error;
use crate::http::extract::DEFAULT_MAX_BODY_BYTES;
use crate::http::multipart::DEFAULT_MAX_MEMORY;

/// Mapping from MIME tokens to codecs.
///
/// `Encoding::new()` installs:
///
/// | token | codec |
/// |---|---|
/// | `application/x-www-form-urlencoded` | form |
/// | `multipart/form-data` | multipart over form |
/// | `application/json` | JSON, unknown fields allowed |
/// | `__MIME__/QUERY`, `__MIME__/URI` | form |
/// | `*` | JSON, unknown fields rejected |
#[derive(Debug, Clone)]
pub struct Encoding {
    mime_map: HashMap<String, Arc<dyn Marshaler>>,
    /// Always has the form capability.
    mime_query: Arc<dyn Marshaler>,
    /// Always has the URI capability.
    mime_uri: Arc<dyn Marshaler>,
    mime_wildcard: Arc<dyn Marshaler>,
    max_multipart_memory: usize,
    max_body_bytes: usize,
}

impl Encoding {
    pub fn new() -> Self {
        let mut mime_map: HashMap<String, Arc<dyn Marshaler>> = HashMap::new();
        mime_map.insert(MIME_POST_FORM.to_string(), Arc::new(form::Codec::new()));
        mime_map.insert(
            MIME_MULTIPART_POST_FORM.to_string(),
            Arc::new(multipart::Codec::new(form::Codec::new())),
        );
        mime_map.insert(MIME_JSON.to_string(), Arc::new(json::Codec::default()));

        Self {
            mime_map,
            mime_query: Arc::new(form::Codec::new()),
            mime_uri: Arc::new(form::Codec::new()),
            mime_wildcard: Arc::new(json::Codec::strict()),
            max_multipart_memory: DEFAULT_MAX_MEMORY,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// The defaults plus XML, MessagePack, YAML and TOML under their usual tokens.
    pub fn with_all_formats() -> Self {
        let mut encoding = Self::new();
        let xml: Arc<dyn Marshaler> = Arc::new(xml::Codec);
        let msgpack: Arc<dyn Marshaler> = Arc::new(msgpack::Codec);
        encoding.insert(MIME_XML, Arc::clone(&xml));
        encoding.insert(MIME_XML2, xml);
        encoding.insert(MIME_MSGPACK, Arc::clone(&msgpack));
        encoding.insert(MIME_MSGPACK2, msgpack);
        encoding.insert(MIME_YAML, Arc::new(yaml::Codec));
        encoding.insert(MIME_TOML, Arc::new(toml::Codec));
        encoding
    }

    /// Build a registry from a validated configuration.
    pub fn from_config(config: &EncodingConfig) -> Result<Self, Error> {
        let mut encoding = if config.register_all_formats {
            Self::with_all_formats()
        } else {
            Self::new()
        };
        encoding.max_multipart_memory = config.max_multipart_memory;
        encoding.max_body_bytes = config.max_body_bytes;

        for entry in &config.codecs {
            encoding.register(&entry.mime, codec_for(entry.codec))?;
        }
        Ok(encoding)
    }

    /// Bound applied to buffered `multipart/form-data` bodies.
    pub fn with_max_multipart_memory(mut self, bytes: usize) -> Self {
        self.max_multipart_memory = bytes;
        self
    }

    pub fn max_multipart_memory(&self) -> usize {
        self.max_multipart_memory
    }

    /// Bound applied by the axum extractor to non-multipart bodies.
    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Register a codec for a case-sensitive MIME token, replacing any
    /// previous one.
    ///
    /// `"*"` replaces the fallback codec. The query and URI tokens only accept
    /// codecs with the form and URI capabilities respectively.
    pub fn register(&mut self, mime: &str, marshaler: Arc<dyn Marshaler>) -> Result<(), Error> {
        if mime.is_empty() {
            return Err(Error::InvalidArgument("empty MIME type"));
        }
        match mime {
            MIME_QUERY => {
                if marshaler.as_form().is_none() {
                    return Err(Error::CapabilityMismatch {
                        mime: mime.to_string(),
                        capability: "FormMarshaler",
                    });
                }
                self.mime_query = marshaler;
            }
            MIME_URI => {
                if marshaler.as_uri().is_none() {
                    return Err(Error::CapabilityMismatch {
                        mime: mime.to_string(),
                        capability: "UriMarshaler",
                    });
                }
                self.mime_uri = marshaler;
            }
            MIME_WILDCARD => self.mime_wildcard = marshaler,
            _ => self.insert(mime, marshaler),
        }
        debug!(mime, "Registered marshaler");
        Ok(())
    }

    /// Codec for `mime`; unknown tokens resolve to the wildcard codec.
    pub fn get(&self, mime: &str) -> &Arc<dyn Marshaler> {
        match mime {
            MIME_QUERY => &self.mime_query,
            MIME_URI => &self.mime_uri,
            MIME_WILDCARD => &self.mime_wildcard,
            _ => self.lookup(mime).unwrap_or(&self.mime_wildcard),
        }
    }

    /// Remove the codec for `mime`. Removing an absent token is a no-op;
    /// reserved tokens can only be overridden.
    pub fn delete(&mut self, mime: &str) -> Result<(), Error> {
        if super::mime::is_reserved(mime) {
            return Err(Error::Protected(mime.to_string()));
        }
        if self.mime_map.remove(mime).is_some() {
            debug!(mime, "Deleted marshaler");
        }
        Ok(())
    }

    /// Tokens in the general mapping, sorted.
    pub fn mimes(&self) -> Vec<&str> {
        let mut mimes: Vec<&str> = self.mime_map.keys().map(String::as_str).collect();
        mimes.sort_unstable();
        mimes
    }

    pub fn wildcard(&self) -> &Arc<dyn Marshaler> {
        &self.mime_wildcard
    }

    /// The query slot's form capability.
    pub fn query_marshaler(&self) -> Result<&dyn FormMarshaler, Error> {
        self.mime_query
            .as_form()
            .ok_or_else(|| Error::UnsupportedCapability {
                mime: MIME_QUERY.to_string(),
                capability: "FormMarshaler",
            })
    }

    /// The URI slot's URI capability.
    pub fn uri_marshaler(&self) -> Result<&dyn UriMarshaler, Error> {
        self.mime_uri
            .as_uri()
            .ok_or_else(|| Error::UnsupportedCapability {
                mime: MIME_URI.to_string(),
                capability: "UriMarshaler",
            })
    }

    /// Exact lookup in the general mapping, without wildcard fallback.
    pub(crate) fn lookup(&self, mime: &str) -> Option<&Arc<dyn Marshaler>> {
        self.mime_map.get(mime)
    }

    fn insert(&mut self, mime: &str, marshaler: Arc<dyn Marshaler>) {
        self.mime_map.insert(mime.to_string(), marshaler);
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Self::new()
    }
}

fn codec_for(kind: CodecKind) -> Arc<dyn Marshaler> {
    match kind {
        CodecKind::Json => Arc::new(json::Codec::default()),
        CodecKind::JsonStrict => Arc::new(json::Codec::strict()),
        CodecKind::Form => Arc::new(form::Codec::new()),
        CodecKind::Multipart => Arc::new(multipart::Codec::default()),
        CodecKind::Xml => Arc::new(xml::Codec),
        CodecKind::Yaml => Arc::new(yaml::Codec),
        CodecKind::Toml => Arc::new(toml::Codec),
        CodecKind::Msgpack => Arc::new(msgpack::Codec),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::CodecEntry;
    use crate::registry::mime::MIME_PROTOBUF;

    #[test]
    fn test_defaults_populate_every_slot() {
        let encoding = Encoding::new();
        assert_eq!(
            encoding.mimes(),
            vec![MIME_JSON, MIME_POST_FORM, MIME_MULTIPART_POST_FORM]
        );
        assert!(encoding.query_marshaler().is_ok());
        assert!(encoding.uri_marshaler().is_ok());
        assert!(encoding.get(MIME_MULTIPART_POST_FORM).as_multipart().is_some());
        assert_eq!(encoding.max_multipart_memory(), 32 << 20);
        assert_eq!(encoding.max_body_bytes(), 2 << 20);
    }

    #[test]
    fn test_register_then_get_is_identity() {
        let mut encoding = Encoding::new();
        let codec: Arc<dyn Marshaler> = Arc::new(msgpack::Codec);
        for mime in [MIME_MSGPACK, MIME_WILDCARD, "x-custom"] {
            encoding.register(mime, Arc::clone(&codec)).unwrap();
            assert!(Arc::ptr_eq(encoding.get(mime), &codec), "{mime}");
        }
    }

    #[test]
    fn test_register_overwrites() {
        let mut encoding = Encoding::new();
        let first: Arc<dyn Marshaler> = Arc::new(xml::Codec);
        let second: Arc<dyn Marshaler> = Arc::new(yaml::Codec);
        encoding.register(MIME_XML, first).unwrap();
        encoding.register(MIME_XML, Arc::clone(&second)).unwrap();
        assert!(Arc::ptr_eq(encoding.get(MIME_XML), &second));
    }

    #[test]
    fn test_register_empty_mime_fails() {
        let mut encoding = Encoding::new();
        let err = encoding.register("", Arc::new(xml::Codec)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_reserved_slots_check_capability() {
        let mut encoding = Encoding::new();
        let before_query = Arc::clone(encoding.get(MIME_QUERY));
        let before_uri = Arc::clone(encoding.get(MIME_URI));

        for mime in [MIME_QUERY, MIME_URI] {
            let err = encoding
                .register(mime, Arc::new(json::Codec::default()))
                .unwrap_err();
            assert!(matches!(err, Error::CapabilityMismatch { .. }), "{mime}");
        }
        assert!(Arc::ptr_eq(encoding.get(MIME_QUERY), &before_query));
        assert!(Arc::ptr_eq(encoding.get(MIME_URI), &before_uri));

        let form: Arc<dyn Marshaler> = Arc::new(form::Codec::new());
        encoding.register(MIME_QUERY, Arc::clone(&form)).unwrap();
        encoding.register(MIME_URI, Arc::clone(&form)).unwrap();
        assert!(Arc::ptr_eq(encoding.get(MIME_QUERY), &form));
        assert!(Arc::ptr_eq(encoding.get(MIME_URI), &form));
    }

    #[test]
    fn test_multipart_codec_cannot_serve_query() {
        let mut encoding = Encoding::new();
        let err = encoding
            .register(MIME_QUERY, Arc::new(multipart::Codec::default()))
            .unwrap_err();
        assert!(err.to_string().contains("FormMarshaler"));
    }

    #[test]
    fn test_get_unknown_falls_back_to_wildcard() {
        let encoding = Encoding::new();
        for mime in ["", MIME_PROTOBUF, "APPLICATION/JSON"] {
            assert!(Arc::ptr_eq(encoding.get(mime), encoding.wildcard()), "{mime:?}");
        }
    }

    #[test]
    fn test_delete_reserved_fails_and_keeps_state() {
        let mut encoding = Encoding::new();
        for mime in [MIME_WILDCARD, MIME_QUERY, MIME_URI] {
            let before = Arc::clone(encoding.get(mime));
            let err = encoding.delete(mime).unwrap_err();
            assert!(matches!(err, Error::Protected(ref m) if m == mime));
            assert!(Arc::ptr_eq(encoding.get(mime), &before));
        }
    }

    #[test]
    fn test_delete_general_entry() {
        let mut encoding = Encoding::new();
        encoding.delete(MIME_JSON).unwrap();
        assert!(encoding.lookup(MIME_JSON).is_none());
        assert!(Arc::ptr_eq(encoding.get(MIME_JSON), encoding.wildcard()));
        // Absent tokens are a no-op.
        encoding.delete(MIME_JSON).unwrap();
        encoding.delete("never/registered").unwrap();
    }

    #[test]
    fn test_with_all_formats() {
        let encoding = Encoding::with_all_formats();
        for mime in [MIME_XML, MIME_XML2, MIME_MSGPACK, MIME_MSGPACK2, MIME_YAML, MIME_TOML] {
            assert!(encoding.lookup(mime).is_some(), "{mime}");
        }
        assert!(Arc::ptr_eq(
            encoding.get(MIME_XML),
            encoding.get(MIME_XML2)
        ));
    }

    #[test]
    fn test_from_config() {
        let config = EncodingConfig {
            max_multipart_memory: 1024,
            max_body_bytes: 512,
            codecs: vec![
                CodecEntry {
                    mime: MIME_YAML.to_string(),
                    codec: CodecKind::Yaml,
                },
                CodecEntry {
                    mime: MIME_WILDCARD.to_string(),
                    codec: CodecKind::Json,
                },
            ],
            ..EncodingConfig::default()
        };
        let encoding = Encoding::from_config(&config).unwrap();
        assert_eq!(encoding.max_multipart_memory(), 1024);
        assert_eq!(encoding.max_body_bytes(), 512);
        assert!(encoding.lookup(MIME_YAML).is_some());
        assert!(encoding.lookup(MIME_XML).is_none());
    }

    #[test]
    fn test_from_config_rejects_capability_mismatch() {
        let config = EncodingConfig {
            codecs: vec![CodecEntry {
                mime: MIME_URI.to_string(),
                codec: CodecKind::Xml,
            }],
            ..EncodingConfig::default()
        };
        assert!(matches!(
            Encoding::from_config(&config),
            Err(Error::CapabilityMismatch { .. })
        ));
    }

    #[test]
    fn test_concurrent_reads() {
        let encoding = Arc::new(Encoding::with_all_formats());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let encoding = Arc::clone(&encoding);
                std::thread::spawn(move || {
                    let mime = if i % 2 == 0 { MIME_JSON } else { "unknown/type" };
                    for _ in 0..1000 {
                        let codec = encoding.get(mime);
                        assert!(codec.content_type(&"x").starts_with("application/json"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
