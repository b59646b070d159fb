//! Header negotiation subsystem.
//!
//! # Data Flow
//! ```text
//! Content-Type values ──▶ parse_media_type ──▶ first exact registry hit ──▶ (token, codec)
//!                                      no hit / unparseable ──▶ ("*", wildcard)
//!
//! Accept values ──▶ parse_accept_header ──▶ first exact registry hit ──▶ codec
//!                                   no hit ──▶ wildcard
//! ```
//!
//! # Design Decisions
//! - Matching is exact against the general mapping; no `type/*` globbing
//! - Quality weights are ignored; header order decides
//! - An unparseable value is skipped, never fatal
//! - Accept candidates are compared verbatim, parameters included

pub mod accept;
pub mod media_type;

use std::sync::Arc;

use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, Request, Response};
use tracing::debug;

use crate::codec::Marshaler;
use crate::registry::mime::MIME_WILDCARD;
use crate::registry::Encoding;

pub use accept::parse_accept_header;
pub use media_type::{parse_media_type, MediaType, MediaTypeError};

impl Encoding {
    /// Inbound token and codec for a request, from its `Content-Type` headers.
    pub fn inbound_for_request<B>(&self, req: &Request<B>) -> (String, &Arc<dyn Marshaler>) {
        self.inbound_for_headers(req.headers())
    }

    /// Inbound codec for a response, from its `Content-Type` headers.
    pub fn inbound_for_response<B>(&self, resp: &Response<B>) -> &Arc<dyn Marshaler> {
        self.inbound_for_headers(resp.headers()).1
    }

    pub fn inbound_for_headers(&self, headers: &HeaderMap) -> (String, &Arc<dyn Marshaler>) {
        self.marshaler_from_content_type(header_values(headers, CONTENT_TYPE))
    }

    /// Outbound codec for a request, from its `Accept` headers.
    pub fn outbound_for_request<B>(&self, req: &Request<B>) -> &Arc<dyn Marshaler> {
        self.outbound_for_headers(req.headers())
    }

    pub fn outbound_for_headers(&self, headers: &HeaderMap) -> &Arc<dyn Marshaler> {
        self.marshaler_from_accept(header_values(headers, ACCEPT))
    }

    /// Resolve raw `Content-Type` values in order.
    ///
    /// Returns the matched media type, or `"*"` together with the wildcard
    /// codec when nothing matches.
    pub fn marshaler_from_content_type<'v, I>(&self, values: I) -> (String, &Arc<dyn Marshaler>)
    where
        I: IntoIterator<Item = &'v str>,
    {
        for value in values {
            let media_type = match parse_media_type(value) {
                Ok(media_type) => media_type,
                Err(err) => {
                    debug!(value, error = %err, "Skipping unparseable Content-Type");
                    continue;
                }
            };
            if let Some(marshaler) = self.lookup(media_type.essence()) {
                debug!(mime = media_type.essence(), "Resolved inbound marshaler");
                return (media_type.essence().to_string(), marshaler);
            }
        }
        (MIME_WILDCARD.to_string(), self.wildcard())
    }

    /// Resolve raw `Accept` values; the first registered candidate across all
    /// values wins, otherwise the wildcard codec.
    pub fn marshaler_from_accept<'v, I>(&self, values: I) -> &Arc<dyn Marshaler>
    where
        I: IntoIterator<Item = &'v str>,
    {
        for value in values {
            for candidate in parse_accept_header(value) {
                if let Some(marshaler) = self.lookup(candidate) {
                    debug!(mime = candidate, "Resolved outbound marshaler");
                    return marshaler;
                }
            }
        }
        self.wildcard()
    }
}

/// Header values as strings in arrival order; non-ASCII values are skipped.
fn header_values<'h>(headers: &'h HeaderMap, name: HeaderName) -> impl Iterator<Item = &'h str> {
    headers
        .get_all(&name)
        .iter()
        .filter_map(move |value| match value.to_str() {
            Ok(value) => Some(value),
            Err(_) => {
                debug!(header = %name, "Skipping non-ASCII header value");
                None
            }
        })
}
