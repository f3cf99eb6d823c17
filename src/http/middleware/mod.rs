//! Request/response middleware.

pub mod policy;
pub mod response_log;

pub use response_log::{response_log_middleware, Envelope, EnvelopeWriter, ResponseLogState};
