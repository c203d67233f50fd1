//! HTTP API server
//!
//! Exposes the lesson and pronunciation relays over axum with permissive CORS
//! so the browser client can call it from any origin.

pub mod error;
pub mod handlers;

use crate::app::App;
use crate::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ErrorResponse;

/// Header carrying the caller's own Gemini key.
pub const API_KEY_HEADER: &str = "x-gemini-api-key";

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<App>,
}

/// Build the API router. `max_audio_bytes` caps the multipart upload size.
pub fn router(app: Arc<App>, max_audio_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/generate-lesson", post(handlers::generate_lesson))
        .route(
            "/api/analyze-audio",
            post(handlers::analyze_audio).layer(DefaultBodyLimit::max(max_audio_bytes)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { app })
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("API listening on http://{}", addr);
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("API server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
