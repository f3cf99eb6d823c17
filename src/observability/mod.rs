//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! middleware builds Record
//!     → RecordSink (trait boundary)
//!         → TracingSink → tracing subscriber (text / JSON / GCP)
//!         → CensorSink  → masks configured attributes, then forwards
//!         → CaptureSink → in-memory, for tests
//! ```

pub mod logging;
pub mod record;

pub use record::{AttrValue, CaptureSink, CensorSink, Level, Record, RecordSink, TracingSink};
