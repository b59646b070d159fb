//! Error types shared by the registry, the codecs and the bind/render façade.

use axum::http::header::InvalidHeaderValue;
use thiserror::Error;

use crate::http::multipart::MultipartError;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`Encoding`](crate::Encoding) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Empty MIME token passed to `register`.
    #[error("encoding: invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The codec lacks the narrower capability a reserved slot requires.
    #[error("encoding: marshaler for {mime} must implement {capability}")]
    CapabilityMismatch {
        mime: String,
        capability: &'static str,
    },

    /// Reserved tokens can be overridden but never removed.
    #[error("encoding: MIME({0}) can't be deleted, but it can be overridden")]
    Protected(String),

    /// The resolved codec cannot serve the selected binding path.
    #[error("encoding: marshaler for {mime} does not support {capability}")]
    UnsupportedCapability {
        mime: String,
        capability: &'static str,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("encoding: multipart: {0}")]
    Multipart(#[from] MultipartError),

    #[error("encoding: invalid Content-Type value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("encoding: I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request body exceeded the buffering limit.
    #[error("encoding: request body exceeds limit of {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// The axum adapter failed to buffer the request body.
    #[error("encoding: failed to read request body: {0}")]
    Body(#[from] axum::Error),
}

/// A failure reported verbatim by a pluggable codec.
#[derive(Debug, Error)]
#[error("{format}: {source}")]
pub struct CodecError {
    format: &'static str,
    #[source]
    source: BoxError,
}

impl CodecError {
    /// Wrap an error raised by the library backing `format`.
    pub fn new<E>(format: &'static str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self {
            format,
            source: source.into(),
        }
    }

    /// Short name of the codec that failed (e.g. `"json"`).
    pub fn format(&self) -> &'static str {
        self.format
    }
}
