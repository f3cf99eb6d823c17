//! Severity policy for intercepted responses.

use axum::http::StatusCode;

use crate::observability::record::Level;

/// Map a response status to the severity of the record to emit, if any.
///
/// Client- and server-caused failures are equally loud: a 4xx here means a
/// handler built an error envelope, and those are exactly the responses
/// worth a record. Anything below 400 stays quiet.
pub fn reportable_level(status: StatusCode) -> Option<Level> {
    if status.is_client_error() || status.is_server_error() {
        Some(Level::Error)
    } else {
        None
    }
}
