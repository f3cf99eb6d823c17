//! Provenance-aware error annotation and response logging.
//!
//! Handlers wrap failures with [`provenance::annotate`]; the encoded call
//! site rides inside the envelope message until the response middleware
//! strips it, emits one structured record, and forwards a clean body to
//! the client.

pub mod config;
pub mod http;
pub mod observability;
pub mod provenance;

pub use config::ServiceConfig;
pub use http::{Envelope, HttpServer};
pub use provenance::{annotate, annotate_skip, message, Annotated};
