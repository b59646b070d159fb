//! Shared fixtures for integration tests.

use std::sync::Arc;

use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::Request;
use http_encoding::Encoding;
use serde::{Deserialize, Serialize};

/// Two-field payload used across the suites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestMode {
    pub id: String,
    pub name: String,
}

pub fn sample() -> TestMode {
    TestMode {
        id: "foo".into(),
        name: "bar".into(),
    }
}

/// Registry with every built-in format, shared like router state.
#[allow(dead_code)]
pub fn shared_encoding() -> Arc<Encoding> {
    Arc::new(Encoding::with_all_formats())
}

/// A POST request carrying `body` with the given Content-Type.
#[allow(dead_code)]
pub fn post_with(content_type: &str, body: Vec<u8>) -> Request<std::io::Cursor<Vec<u8>>> {
    Request::post("/test")
        .header(CONTENT_TYPE, content_type)
        .body(std::io::Cursor::new(body))
        .unwrap()
}

/// A GET request with only an Accept header.
#[allow(dead_code)]
pub fn get_accepting(accept: &str) -> Request<()> {
    Request::get("/test").header(ACCEPT, accept).body(()).unwrap()
}
