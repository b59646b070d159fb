//! MIME registry subsystem.
//!
//! # Responsibilities
//! - Map MIME tokens to codecs
//! - Keep the wildcard, query and URI slots populated at all times
//! - Check the narrower form/URI capability when those slots are overridden
//!
//! # Design Decisions
//! - Reserved tokens live in dedicated slots, never in the general mapping
//! - Capability checks run once at registration, not per request
//! - The registry is an explicit value shared by reference; there is no global instance
//! - Mutation takes `&mut self`, so a registry shared behind an `Arc` is read-only

pub mod encoding;
pub mod mime;

pub use encoding::Encoding;
