//! axum integration.
//!
//! # Responsibilities
//! - `Negotiated<T>` extractor: buffer the body, then [`Encoding::bind`]
//! - Map bind failures to client error statuses
//! - [`respond`]: render a value for the request's `Accept` headers
//!
//! # Design Decisions
//! - The registry comes from router state through `FromRef<S>` for `Arc<Encoding>`
//! - Bodies are buffered before binding; the codec layer stays synchronous
//! - Multipart bodies are bounded by the multipart memory limit, everything else by
//!   `max_body_bytes`

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{FromRef, FromRequest, Request};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::Error;
use crate::http::bind::is_retrieval;
use crate::http::multipart::MultipartError;
use crate::http::render::ResponseBuffer;
use crate::registry::mime::MIME_MULTIPART_POST_FORM;
use crate::registry::Encoding;

/// Default bound on buffered non-multipart request bodies (2 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 << 20;

/// Extractor that binds the request with the shared [`Encoding`].
///
/// ```ignore
/// async fn create(Negotiated(user): Negotiated<User>) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct Negotiated<T>(pub T);

impl<S, T> FromRequest<S> for Negotiated<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    Arc<Encoding>: FromRef<S>,
{
    type Rejection = NegotiationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let encoding = Arc::<Encoding>::from_ref(state);
        let (parts, body) = req.into_parts();

        let bytes = if is_retrieval(&parts.method) {
            Bytes::new()
        } else {
            let (mime, _) = encoding.inbound_for_headers(&parts.headers);
            let limit = if mime == MIME_MULTIPART_POST_FORM {
                encoding.max_multipart_memory()
            } else {
                encoding.max_body_bytes()
            };
            read_body(body, limit).await?
        };

        let req = axum::http::Request::from_parts(parts, bytes.as_ref());
        encoding.bind(req).map(Negotiated).map_err(NegotiationRejection)
    }
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, Error> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if buf.len() + chunk.len() > limit {
            return Err(Error::BodyTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buf))
}

/// Rejection produced by [`Negotiated`].
#[derive(Debug)]
pub struct NegotiationRejection(pub Error);

impl NegotiationRejection {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::UnsupportedCapability { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::BodyTooLarge { .. } | Error::Multipart(MultipartError::TotalTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn into_inner(self) -> Error {
        self.0
    }
}

impl From<Error> for NegotiationRejection {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl std::fmt::Display for NegotiationRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for NegotiationRejection {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl IntoResponse for NegotiationRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        debug!(status = %status, error = %self.0, "Rejecting request");
        (status, self.0.to_string()).into_response()
    }
}

/// Render `value` for the given request headers with `status`.
///
/// Render failures become `500 Internal Server Error` and are logged.
pub fn respond<V: Serialize>(
    encoding: &Encoding,
    headers: &HeaderMap,
    status: StatusCode,
    value: &V,
) -> Response {
    let mut buffer = ResponseBuffer::new().with_status(status);
    match encoding.render_with_headers(&mut buffer, headers, Some(value)) {
        Ok(()) => buffer.into_response(),
        Err(err) => {
            error!(error = %err, "Failed to render response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
