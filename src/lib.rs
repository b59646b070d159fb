//! Content negotiation for HTTP message bodies.
//!
//! # Architecture Overview
//!
//! ```text
//!     Request headers          ┌──────────────┐     ┌──────────────┐
//!     Content-Type / Accept ──▶│  negotiate   │────▶│   registry   │
//!                              │ header parse │     │ MIME → codec │
//!                              └──────────────┘     └──────┬───────┘
//!                                                          │
//!     Request body / query ──▶ ┌──────────────┐            ▼
//!                              │  http::bind  │──▶  codec (json, form, xml, ...)
//!     Response body ◀───────── │ http::render │◀──  marshal / decode
//!                              └──────────────┘
//! ```
//!
//! The [`Encoding`] registry is built once, configured during startup and then
//! shared read-only (usually behind an `Arc`) by every request handler.

pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod negotiate;
pub mod observability;
pub mod registry;

pub use codec::{FormValues, Marshaler, Slot, Target};
pub use config::EncodingConfig;
pub use error::{CodecError, Error};
pub use http::{Negotiated, ResponseBuffer, ResponseWriter};
pub use registry::mime;
pub use registry::Encoding;
