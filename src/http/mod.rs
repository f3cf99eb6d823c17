//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (Axum setup, layers)
//!     → middleware/response_log.rs (meta capture, body buffering)
//!     → handlers write envelopes (possibly provenance-tagged)
//!     → middleware decodes the token, emits records, rewrites the body
//!     → client receives a token-free response
//! ```

pub mod client;
pub mod middleware;
pub mod server;

pub use middleware::{Envelope, ResponseLogState};
pub use server::HttpServer;
