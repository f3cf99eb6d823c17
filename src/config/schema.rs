//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files;
//! every field has a default so a missing file or empty document works.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// Response interception settings.
    pub response_log: ResponseLogConfig,

    /// Outbound HTTP client settings.
    pub client: ClientConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directives used when `RUST_LOG` is unset (e.g., "info").
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Attribute keys to mask, mapped to their replacement text.
    pub censor: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            censor: HashMap::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines for local development.
    Text,
    /// JSON lines.
    #[default]
    Json,
    /// JSON lines with Cloud Logging key names.
    Gcp,
}

/// Response interception settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseLogConfig {
    /// Inbound header copied verbatim to the `ref_id` attribute.
    pub ref_id_header: String,

    /// Extra inbound headers attached to every record of the request.
    /// Each becomes an attribute keyed by the lowercased header name with
    /// `-` replaced by `_`.
    pub meta_headers: Vec<String>,
}

impl Default for ResponseLogConfig {
    fn default() -> Self {
        Self {
            ref_id_header: "x-ref-id".to_string(),
            meta_headers: Vec::new(),
        }
    }
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Total request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            pool_max_idle_per_host: 100,
        }
    }
}
