//! Structured records and the sink boundary they are emitted through.
//!
//! The middleware never talks to a logging backend directly; it builds a
//! [`Record`] and hands it to a [`RecordSink`]. Production wires in
//! [`TracingSink`], tests wire in [`CaptureSink`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

/// Severity of an emitted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// Attribute value: text or integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Int(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Int(value.into())
    }
}

/// One structured record: severity, message, ordered attributes.
/// Attribute keys are unique; insertion order is preserved all the way to
/// the sink.
#[derive(Debug, Clone)]
pub struct Record {
    pub level: Level,
    pub message: String,
    pub attrs: Vec<(Cow<'static, str>, AttrValue)>,
}

impl Record {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Record {
            level,
            message: message.into(),
            attrs: Vec::new(),
        }
    }

    /// Append an attribute, keeping the first value on a duplicate key.
    pub fn attr(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<AttrValue>) -> Self {
        let key = key.into();
        if !self.attrs.iter().any(|(k, _)| *k == key) {
            self.attrs.push((key, value.into()));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attrs
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }
}

/// Destination for records. Implementations are called from request tasks
/// concurrently and must not block.
pub trait RecordSink: Send + Sync {
    fn emit(&self, record: Record);
}

/// Production sink: forwards records as `tracing` events.
///
/// Well-known attribute keys become first-class event fields; anything
/// else is folded into a single `meta` field. Absent fields are elided.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl RecordSink for TracingSink {
    fn emit(&self, record: Record) {
        let mut file = None;
        let mut line = None;
        let mut func = None;
        let mut code = None;
        let mut ref_id = None;
        let mut error = None;
        let mut len = None;
        let mut body = None;
        let mut meta = String::new();

        for (key, value) in &record.attrs {
            match (key.as_ref(), value) {
                ("file", v) => file = Some(v.to_string()),
                ("line", AttrValue::Int(v)) => line = Some(*v),
                ("func", v) => func = Some(v.to_string()),
                ("code", AttrValue::Int(v)) => code = Some(*v),
                ("ref_id", v) => ref_id = Some(v.to_string()),
                ("error", v) => error = Some(v.to_string()),
                ("len", AttrValue::Int(v)) => len = Some(*v),
                ("body", v) => body = Some(v.to_string()),
                (key, value) => {
                    if !meta.is_empty() {
                        meta.push(' ');
                    }
                    let _ = write!(meta, "{key}={value}");
                }
            }
        }
        let meta = if meta.is_empty() { None } else { Some(meta) };

        match record.level {
            Level::Debug => tracing::debug!(
                file = file.as_deref(),
                line,
                func = func.as_deref(),
                code,
                ref_id = ref_id.as_deref(),
                error = error.as_deref(),
                len,
                body = body.as_deref(),
                meta = meta.as_deref(),
                "{}",
                record.message
            ),
            Level::Info => tracing::info!(
                file = file.as_deref(),
                line,
                func = func.as_deref(),
                code,
                ref_id = ref_id.as_deref(),
                error = error.as_deref(),
                len,
                body = body.as_deref(),
                meta = meta.as_deref(),
                "{}",
                record.message
            ),
            Level::Warn => tracing::warn!(
                file = file.as_deref(),
                line,
                func = func.as_deref(),
                code,
                ref_id = ref_id.as_deref(),
                error = error.as_deref(),
                len,
                body = body.as_deref(),
                meta = meta.as_deref(),
                "{}",
                record.message
            ),
            Level::Error => tracing::error!(
                file = file.as_deref(),
                line,
                func = func.as_deref(),
                code,
                ref_id = ref_id.as_deref(),
                error = error.as_deref(),
                len,
                body = body.as_deref(),
                meta = meta.as_deref(),
                "{}",
                record.message
            ),
        }
    }
}

/// Masks configured attribute values before forwarding. Keys map to the
/// replacement text verbatim.
pub struct CensorSink {
    inner: Arc<dyn RecordSink>,
    masks: HashMap<String, String>,
}

impl CensorSink {
    pub fn new(inner: Arc<dyn RecordSink>, masks: HashMap<String, String>) -> Self {
        CensorSink { inner, masks }
    }
}

impl RecordSink for CensorSink {
    fn emit(&self, mut record: Record) {
        for (key, value) in record.attrs.iter_mut() {
            if let Some(mask) = self.masks.get(key.as_ref()) {
                *value = AttrValue::Str(mask.clone());
            }
        }
        self.inner.emit(record);
    }
}

/// In-memory sink for assertions on emitted records.
#[derive(Default)]
pub struct CaptureSink {
    records: Mutex<Vec<Record>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        CaptureSink::default()
    }

    /// Snapshot of everything emitted so far, in order.
    pub fn records(&self) -> Vec<Record> {
        match self.records.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl RecordSink for CaptureSink {
    fn emit(&self, record: Record) {
        match self.records.lock() {
            Ok(mut guard) => guard.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_attrs_keep_order_and_uniqueness() {
        let record = Record::new(Level::Error, "boom")
            .attr("file", "svc.rs")
            .attr("line", 7u32)
            .attr("file", "shadowed.rs");
        let keys: Vec<&str> = record.attrs.iter().map(|(k, _)| k.as_ref()).collect();
        assert_eq!(keys, vec!["file", "line"]);
        assert_eq!(record.get("file"), Some(&AttrValue::Str("svc.rs".into())));
    }

    #[test]
    fn test_capture_sink_preserves_emission_order() {
        let sink = CaptureSink::new();
        sink.emit(Record::new(Level::Debug, "first"));
        sink.emit(Record::new(Level::Warn, "second"));
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "first");
        assert_eq!(records[1].level, Level::Warn);
    }

    #[test]
    fn test_censor_sink_masks_configured_keys() {
        let capture = Arc::new(CaptureSink::new());
        let masks = HashMap::from([("cid".to_string(), "xxxxxxxxxxxxx".to_string())]);
        let censor = CensorSink::new(capture.clone(), masks);

        censor.emit(
            Record::new(Level::Info, "customer lookup")
                .attr("cid", "cust-8841")
                .attr("region", "eu-west-1"),
        );

        let records = capture.records();
        assert_eq!(
            records[0].get("cid"),
            Some(&AttrValue::Str("xxxxxxxxxxxxx".into()))
        );
        assert_eq!(
            records[0].get("region"),
            Some(&AttrValue::Str("eu-west-1".into()))
        );
    }
}
