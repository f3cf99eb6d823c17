//! Response interception.
//!
//! Handlers annotate errors with provenance tokens; those tokens must never
//! reach a client. This middleware buffers each outgoing body, decodes the
//! token out of the envelope message, emits a structured record for
//! reportable responses, and forwards a clean body. Bodies that carry no
//! token are forwarded byte for byte.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::config::{ResponseLogConfig, ServiceConfig};
use crate::observability::record::{CensorSink, Level, Record, RecordSink, TracingSink};
use crate::provenance::{decode, Decoded};

use super::policy::reportable_level;

/// The response body shape handlers use for errors.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Envelope {
    /// Application error code; 0 means unset and is omitted from records.
    #[serde(default)]
    pub code: i64,

    #[serde(default)]
    pub message: String,
}

impl Envelope {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Envelope {
            code,
            message: message.into(),
        }
    }
}

/// Shared middleware state: where records go and which inbound headers are
/// copied onto them.
#[derive(Clone)]
pub struct ResponseLogState {
    sink: Arc<dyn RecordSink>,
    config: Arc<ResponseLogConfig>,
}

impl ResponseLogState {
    /// Production wiring: tracing-backed sink, censor rules applied when
    /// configured.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let sink: Arc<dyn RecordSink> = if config.logging.censor.is_empty() {
            Arc::new(TracingSink)
        } else {
            Arc::new(CensorSink::new(
                Arc::new(TracingSink),
                config.logging.censor.clone(),
            ))
        };
        Self::with_sink(config.response_log.clone(), sink)
    }

    /// Explicit sink injection; tests hand in a capture sink.
    pub fn with_sink(config: ResponseLogConfig, sink: Arc<dyn RecordSink>) -> Self {
        ResponseLogState {
            sink,
            config: Arc::new(config),
        }
    }
}

/// Per-response interceptor.
///
/// `write` consumes the buffered body exactly once: it parses the body as
/// a JSON object, reads the envelope fields out of it, decodes the
/// provenance token, asks the policy whether to emit, and returns the
/// bytes to forward. A second call forwards its input untouched.
pub struct EnvelopeWriter<'a> {
    status: StatusCode,
    meta: &'a [(String, String)],
    sink: &'a dyn RecordSink,
    written: bool,
}

impl<'a> EnvelopeWriter<'a> {
    pub fn new(
        status: StatusCode,
        meta: &'a [(String, String)],
        sink: &'a dyn RecordSink,
    ) -> Self {
        EnvelopeWriter {
            status,
            meta,
            sink,
            written: false,
        }
    }

    pub fn write(&mut self, body: &[u8]) -> Vec<u8> {
        if self.written {
            return body.to_vec();
        }
        self.written = true;

        // Envelopes are JSON objects. Parsing into the map makes arrays
        // and scalars fail here rather than filling the struct fields
        // positionally.
        let mut doc: serde_json::Map<String, serde_json::Value> =
            match serde_json::from_slice(body) {
                Ok(doc) => doc,
                Err(err) => {
                    self.emit_parse_failure(&err.to_string(), body);
                    return body.to_vec();
                }
            };

        let (code, message) = match envelope_fields(&doc) {
            Ok(fields) => fields,
            Err(detail) => {
                self.emit_parse_failure(detail, body);
                return body.to_vec();
            }
        };

        let decoded = decode(message);

        if let Some(level) = reportable_level(self.status) {
            let mut record = Record::new(level, decoded.text());
            if let Decoded::Located {
                file,
                line,
                function,
                ..
            } = &decoded
            {
                record = record
                    .attr("file", file.clone())
                    .attr("line", *line)
                    .attr("func", function.clone());
            }
            for (key, value) in self.meta {
                record = record.attr(key.clone(), value.clone());
            }
            if code != 0 {
                record = record.attr("code", code);
            }
            self.sink.emit(record);
        }

        match decoded {
            // Replace the message in place; every other field and the
            // field order survive re-serialization.
            Decoded::Located { text, .. } => {
                doc.insert("message".to_string(), serde_json::Value::String(text));
                match serde_json::to_vec(&doc) {
                    Ok(bytes) => bytes,
                    Err(_) => body.to_vec(),
                }
            }
            Decoded::Plain(_) => body.to_vec(),
        }
    }

    /// A body that is not an envelope is an anomaly on its own: one DEBUG
    /// record with the parse detail, one WARN record with a fixed signal.
    fn emit_parse_failure(&self, detail: &str, body: &[u8]) {
        let mut debug = Record::new(Level::Debug, detail)
            .attr("len", body.len() as i64)
            .attr("body", String::from_utf8_lossy(body).into_owned());
        let mut warn = Record::new(Level::Warn, "response not standard");
        for (key, value) in self.meta {
            debug = debug.attr(key.clone(), value.clone());
            warn = warn.attr(key.clone(), value.clone());
        }
        self.sink.emit(debug);
        self.sink.emit(warn);
    }
}

/// Read the envelope fields out of a parsed object. Missing and `null`
/// fields are unset; a present field of the wrong type makes the body a
/// non-envelope.
fn envelope_fields(
    doc: &serde_json::Map<String, serde_json::Value>,
) -> Result<(i64, &str), &'static str> {
    let code = match doc.get("code") {
        None | Some(serde_json::Value::Null) => 0,
        Some(value) => value.as_i64().ok_or("envelope code is not an integer")?,
    };
    let message = match doc.get("message") {
        None | Some(serde_json::Value::Null) => "",
        Some(value) => value.as_str().ok_or("envelope message is not a string")?,
    };
    Ok((code, message))
}

/// Attributes collected from inbound headers, attached to every record of
/// the request.
fn request_meta(config: &ResponseLogConfig, headers: &HeaderMap) -> Vec<(String, String)> {
    let mut meta = Vec::new();
    if let Some(value) = headers
        .get(config.ref_id_header.as_str())
        .and_then(|v| v.to_str().ok())
    {
        meta.push(("ref_id".to_string(), value.to_string()));
    }
    for name in &config.meta_headers {
        if let Some(value) = headers.get(name.as_str()).and_then(|v| v.to_str().ok()) {
            meta.push((attr_key(name), value.to_string()));
        }
    }
    meta
}

fn attr_key(header: &str) -> String {
    header.to_ascii_lowercase().replace('-', "_")
}

/// Buffer the downstream response, run the interceptor once, forward the
/// result with a corrected Content-Length.
pub async fn response_log_middleware(
    State(state): State<ResponseLogState>,
    req: Request,
    next: Next,
) -> Response {
    let meta = request_meta(&state.config, req.headers());

    let response = next.run(req).await;
    let (mut parts, body) = response.into_parts();

    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(error = %err, "response body unreadable");
            parts.headers.remove(header::CONTENT_LENGTH);
            parts.headers.remove(header::TRANSFER_ENCODING);
            return Response::from_parts(parts, Body::empty());
        }
    };

    // An empty body means the handler never wrote; nothing to intercept.
    if bytes.is_empty() {
        return Response::from_parts(parts, Body::from(bytes));
    }

    let mut writer = EnvelopeWriter::new(parts.status, &meta, state.sink.as_ref());
    let out = writer.write(&bytes);

    parts.headers.remove(header::TRANSFER_ENCODING);
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(out.len()));
    Response::from_parts(parts, Body::from(out))
}
