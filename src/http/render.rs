//! Response rendering and encode-only helpers.

use std::io::{self, Write};

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Request, Response, StatusCode};
use axum::response::IntoResponse;
use serde::Serialize;
use tracing::warn;

use crate::codec::FormValues;
use crate::error::Error;
use crate::registry::Encoding;

/// Destination of a rendered response: a byte sink with mutable headers.
pub trait ResponseWriter: Write {
    fn headers_mut(&mut self) -> &mut HeaderMap;
}

/// In-memory [`ResponseWriter`] that converts into an axum response.
#[derive(Debug)]
pub struct ResponseBuffer {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for ResponseBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ResponseWriter for ResponseBuffer {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

impl IntoResponse for ResponseBuffer {
    fn into_response(self) -> axum::response::Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Encoding {
    /// Marshal `value` with the codec negotiated from the request's `Accept`
    /// headers, set `Content-Type` and write the body.
    ///
    /// `None` writes nothing. A marshal failure leaves `writer` untouched; a
    /// write failure after the header was set is returned as-is.
    pub fn render<W, B, V>(
        &self,
        writer: &mut W,
        req: &Request<B>,
        value: Option<&V>,
    ) -> Result<(), Error>
    where
        W: ResponseWriter + ?Sized,
        V: Serialize,
    {
        self.render_with_headers(writer, req.headers(), value)
    }

    /// [`Encoding::render`] against bare request headers.
    pub fn render_with_headers<W, V>(
        &self,
        writer: &mut W,
        headers: &HeaderMap,
        value: Option<&V>,
    ) -> Result<(), Error>
    where
        W: ResponseWriter + ?Sized,
        V: Serialize,
    {
        let Some(value) = value else {
            return Ok(());
        };
        let marshaler = self.outbound_for_headers(headers);
        let data = marshaler.marshal(value)?;
        let content_type = HeaderValue::from_str(&marshaler.content_type(value))?;

        writer.headers_mut().insert(CONTENT_TYPE, content_type);
        if let Err(err) = writer.write_all(&data) {
            warn!(error = %err, "Response write failed after headers were set");
            return Err(err.into());
        }
        Ok(())
    }

    /// Marshal `value` with the codec registered for `mime`.
    pub fn encode<V: Serialize>(&self, mime: &str, value: &V) -> Result<Vec<u8>, Error> {
        Ok(self.get(mime).marshal(value)?)
    }

    /// Encode `value` into query fields with the query slot.
    pub fn encode_query<V: Serialize>(&self, value: &V) -> Result<FormValues, Error> {
        Ok(self.query_marshaler()?.encode(value)?)
    }

    /// Expand `{field}` placeholders in `template` with the URI slot,
    /// optionally appending the remaining fields as a query string.
    pub fn encode_url<V: Serialize>(
        &self,
        template: &str,
        value: &V,
        include_query: bool,
    ) -> Result<String, Error> {
        Ok(self.uri_marshaler()?.encode_url(template, value, include_query)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::xml;
    use crate::registry::mime::{MIME_MSGPACK, MIME_XML};
    use axum::http::header::ACCEPT;
    use std::sync::Arc;

    #[derive(Debug, Serialize)]
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

    /// Writer whose body sink always fails.
    #[derive(Default)]
    struct BrokenPipe {
        headers: HeaderMap,
    }

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl ResponseWriter for BrokenPipe {
        fn headers_mut(&mut self) -> &mut HeaderMap {
            &mut self.headers
        }
    }

    #[test]
    fn test_render_none_writes_nothing() {
        let req = Request::get("/").body(()).unwrap();
        let mut out = ResponseBuffer::new();
        Encoding::new()
            .render::<_, _, TestMode>(&mut out, &req, None)
            .unwrap();
        assert!(out.body().is_empty());
        assert!(out.headers().is_empty());
    }

    #[test]
    fn test_render_falls_back_to_wildcard_json() {
        let req = Request::get("/")
            .header(ACCEPT, "application/json; charset=utf-8")
            .body(())
            .unwrap();
        let mut out = ResponseBuffer::new();
        Encoding::new()
            .render(&mut out, &req, Some(&sample()))
            .unwrap();
        assert_eq!(out.body(), br#"{"id":"foo","name":"bar"}"#);
        assert_eq!(
            out.headers()[CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
    }

    #[test]
    fn test_render_uses_accepted_codec() {
        let mut encoding = Encoding::new();
        encoding.register(MIME_XML, Arc::new(xml::Codec)).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html, application/xml"));

        let mut out = ResponseBuffer::new();
        encoding
            .render_with_headers(&mut out, &headers, Some(&sample()))
            .unwrap();
        assert_eq!(out.body(), b"<TestMode><id>foo</id><name>bar</name></TestMode>");
        assert_eq!(out.headers()[CONTENT_TYPE], "application/xml; charset=utf-8");
    }

    #[test]
    fn test_render_marshal_error_leaves_writer_untouched() {
        let mut encoding = Encoding::new();
        encoding
            .register(MIME_MSGPACK, Arc::new(crate::codec::toml::Codec))
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MIME_MSGPACK));

        let mut out = ResponseBuffer::new();
        let err = encoding
            .render_with_headers(&mut out, &headers, Some(&42u8))
            .unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
        assert!(out.headers().is_empty());
        assert!(out.body().is_empty());
    }

    #[test]
    fn test_render_write_error_surfaces_after_header() {
        let mut out = BrokenPipe::default();
        let err = Encoding::new()
            .render_with_headers(&mut out, &HeaderMap::new(), Some(&sample()))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(out.headers.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn test_response_buffer_into_response() {
        let mut out = ResponseBuffer::new().with_status(StatusCode::CREATED);
        out.write_all(b"ok").unwrap();
        let response = out.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_encode_helpers() {
        let encoding = Encoding::new();
        assert_eq!(
            encoding.encode("application/json", &sample()).unwrap(),
            br#"{"id":"foo","name":"bar"}"#
        );
        let query = encoding.encode_query(&sample()).unwrap();
        assert_eq!(query.encode(), "id=foo&name=bar");
        assert_eq!(
            encoding.encode_url("/v1/{id}", &sample(), true).unwrap(),
            "/v1/foo?name=bar"
        );
    }
}
