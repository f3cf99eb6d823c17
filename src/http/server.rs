//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with health handlers
//! - Wire up middleware (response interception, timeout, tracing)
//! - Bind server to listener
//! - Graceful shutdown on SIGINT/SIGTERM

use std::time::Duration;

use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::http::middleware::{response_log_middleware, ResponseLogState};

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Self {
        let state = ResponseLogState::from_config(&config);
        let router = build_router(&config, state);
        Self { router }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers; the binary serves
/// exactly this. The interception layer sits innermost so it only sees
/// bodies handlers actually wrote.
#[allow(deprecated)]
pub fn build_router(config: &ServiceConfig, state: ResponseLogState) -> Router {
    Router::new()
        .route("/livez", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_secs,
                )))
                .layer(from_fn_with_state(state, response_log_middleware)),
        )
}

/// Liveness probe: static identity payload.
async fn liveness_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness probe: status only, no body.
async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
