//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! registry / negotiate / http produce:
//!     → tracing events (debug: registrations, negotiation results, skipped headers)
//!     → warn/error on render failures
//!
//! Consumers:
//!     → logging.rs subscriber (stderr, pretty or JSON)
//! ```
//!
//! # Design Decisions
//! - The library only emits events; installing a subscriber is the binary's choice
//! - JSON format for production, pretty format for development

pub mod logging;

pub use logging::init_logging;
