//! Request binding.
//!
//! # Data Flow
//! ```text
//! GET / HEAD ─────────────▶ query string ──▶ query slot (FormMarshaler)
//! other methods ──▶ Content-Type ──▶ multipart/form-data ──▶ parsed fields ──▶ FormCodec
//!                                └─▶ any other token ──▶ streaming Decoder over the body
//! ```
//!
//! Decode failures surface verbatim; nothing is retried or partially applied.

use std::io::Read;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, Request};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::codec::{FormValues, Slot, Target};
use crate::error::Error;
use crate::http::multipart::{self, MultipartConfig};
use crate::negotiate::parse_media_type;
use crate::registry::mime::MIME_MULTIPART_POST_FORM;
use crate::registry::Encoding;

/// Methods whose requests carry no body to bind.
pub fn is_retrieval(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

impl Encoding {
    /// Decode a request into `T`, choosing the codec from the method and the
    /// `Content-Type` headers.
    pub fn bind<T, B>(&self, req: Request<B>) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Read,
    {
        let mut slot = Slot::new();
        self.bind_target(req, &mut slot)?;
        Ok(slot.take("bind")?)
    }

    /// [`Encoding::bind`] into a type-erased destination.
    pub fn bind_target<B: Read>(&self, req: Request<B>, target: &mut dyn Target) -> Result<(), Error> {
        if is_retrieval(req.method()) {
            return self.bind_query_target(&req, target);
        }

        let (mime, marshaler) = self.inbound_for_request(&req);
        debug!(method = %req.method(), mime = %mime, "Binding request body");

        if mime == MIME_MULTIPART_POST_FORM {
            let codec = marshaler
                .as_multipart()
                .ok_or_else(|| Error::UnsupportedCapability {
                    mime: mime.clone(),
                    capability: "FormCodec",
                })?;
            let boundary = multipart_boundary(req.headers())?;
            let config = MultipartConfig {
                max_total_size: self.max_multipart_memory(),
                ..MultipartConfig::default()
            };
            let mut body = req.into_body();
            let fields = multipart::read_form(&mut body, &boundary, &config)?;
            codec.decode_multipart(&fields, target)?;
            return Ok(());
        }

        marshaler
            .new_decoder(Box::new(req.into_body()))
            .decode(target)?;
        Ok(())
    }

    /// Decode the URL query string through the query slot.
    pub fn bind_query<T, B>(&self, req: &Request<B>) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let mut slot = Slot::new();
        self.bind_query_target(req, &mut slot)?;
        Ok(slot.take("bind_query")?)
    }

    fn bind_query_target<B>(&self, req: &Request<B>, target: &mut dyn Target) -> Result<(), Error> {
        let query = FormValues::parse(req.uri().query().unwrap_or_default().as_bytes());
        self.query_marshaler()?.decode(&query, target)?;
        Ok(())
    }

    /// Decode caller-extracted path parameters through the URI slot.
    pub fn bind_uri<T: DeserializeOwned>(&self, params: &FormValues) -> Result<T, Error> {
        let mut slot = Slot::new();
        self.uri_marshaler()?.decode(params, &mut slot)?;
        Ok(slot.take("bind_uri")?)
    }
}

/// The boundary of the first `multipart/form-data` Content-Type value.
fn multipart_boundary(headers: &HeaderMap) -> Result<String, Error> {
    let media_type = headers
        .get_all(CONTENT_TYPE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| parse_media_type(value).ok())
        .find(|media_type| media_type.essence() == MIME_MULTIPART_POST_FORM);
    let boundary = multipart::check_boundary(media_type.as_ref().and_then(|mt| mt.param("boundary")))?;
    Ok(boundary.to_string())
}
