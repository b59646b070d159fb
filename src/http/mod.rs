//! Bind/render façade over `http` types.
//!
//! # Data Flow
//! ```text
//! Request ──▶ bind.rs (method + Content-Type routing) ──▶ codec decode ──▶ T
//!        multipart/form-data ──▶ multipart.rs (parse, bounded) ──▶ FormCodec
//! T ──▶ render.rs (Accept negotiation, marshal) ──▶ ResponseWriter
//! axum handlers ──▶ extract.rs (Negotiated<T>, respond)
//! ```

pub mod bind;
pub mod extract;
pub mod multipart;
pub mod render;

pub use bind::is_retrieval;
pub use extract::{respond, Negotiated, NegotiationRejection};
pub use render::{ResponseBuffer, ResponseWriter};
