//! Upload web service.
//!
//! All configuration lives in an immutable [`ServerConfig`] shared through
//! [`AppState`]. The template workbook is read from disk on every request
//! and uploads never touch the filesystem.

mod error;
mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use sheetmerge::MergeOptions;
use tower_http::trace::TraceLayer;

const MIB: usize = 1024 * 1024;

/// Settings for the web service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub template: PathBuf,
    /// Request body limit in bytes.
    pub max_upload_bytes: usize,
    pub options: MergeOptions,
}

impl ServerConfig {
    pub fn new(template: PathBuf) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            template,
            max_upload_bytes: 16 * MIB,
            options: MergeOptions::default(),
        }
    }

    pub fn with_max_upload_mb(mut self, mb: usize) -> Self {
        self.max_upload_bytes = mb.saturating_mul(MIB);
        self
    }

    /// The upload limit as shown to users, rounded up to whole MiB.
    pub fn max_upload_mb(&self) -> usize {
        self.max_upload_bytes.div_ceil(MIB)
    }
}

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/process", post(handlers::process))
        .route("/upload_and_process", post(handlers::process))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    if !config.template.is_file() {
        tracing::warn!(
            template = %config.template.display(),
            "template not found; requests will fail until it exists"
        );
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        %addr,
        template = %config.template.display(),
        max_upload_mb = config.max_upload_mb(),
        "listening"
    );

    axum::serve(listener, router(AppState::new(config)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
