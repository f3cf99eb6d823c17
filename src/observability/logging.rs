//! Tracing subscriber setup: text for local work, JSON for deployments,
//! and a Cloud Logging flavor that renames the envelope keys GCP expects.

use std::fmt;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install the process-wide subscriber. `RUST_LOG` overrides the configured
/// level. Call once from the binary entry point.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Gcp => registry
            .with(tracing_subscriber::fmt::layer().event_format(GcpFormat))
            .init(),
    }
}

/// JSON lines with Cloud Logging key names: `severity`, `message`,
/// `timestamp`. Remaining event fields pass through under their own keys.
pub struct GcpFormat;

impl<S, N> FormatEvent<S, N> for GcpFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = serde_json::Map::new();
        event.record(&mut JsonVisitor {
            fields: &mut fields,
        });

        let mut out = serde_json::Map::new();
        out.insert(
            "severity".to_string(),
            severity(*event.metadata().level()).into(),
        );
        out.insert(
            "timestamp".to_string(),
            chrono::Utc::now()
                .to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
                .into(),
        );
        if let Some(message) = fields.remove("message") {
            out.insert("message".to_string(), message);
        }
        out.insert("target".to_string(), event.metadata().target().into());
        for (key, value) in fields {
            out.insert(key, value);
        }

        writeln!(writer, "{}", serde_json::Value::Object(out))
    }
}

fn severity(level: tracing::Level) -> &'static str {
    if level == tracing::Level::ERROR {
        "ERROR"
    } else if level == tracing::Level::WARN {
        "WARNING"
    } else if level == tracing::Level::INFO {
        "INFO"
    } else {
        // GCP has no TRACE severity.
        "DEBUG"
    }
}

struct JsonVisitor<'a> {
    fields: &'a mut serde_json::Map<String, serde_json::Value>,
}

impl tracing::field::Visit for JsonVisitor<'_> {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), format!("{value:?}").into());
    }
}
