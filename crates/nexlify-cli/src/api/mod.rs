//! REST API server
//!
//! Thin axum layer over the library: it validates input, runs batches,
//! serves stored files and maps errors to status codes.

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use nexlify::{BatchOrchestrator, FileStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod state;

pub use state::AppState;

/// Upper bound on the time between two retention sweeps
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Create the API router
///
/// # Routes
///
/// - `POST /api/crawl` - Convert a batch of URLs
/// - `GET /api/download/:filename` - Download one file (`.md` optional)
/// - `GET /api/download/bulk` - Download every stored file as ZIP
/// - `POST /api/download/bulk` - Download the named files as ZIP
/// - `GET /api/files` - List stored files
/// - `GET /api/schema` - JSON Schemas of request and report
/// - `GET /health` - Health check
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/crawl", post(handlers::crawl))
        .route(
            "/api/download/bulk",
            get(handlers::download_all).post(handlers::download_selected),
        )
        .route("/api/download/:filename", get(handlers::download_file))
        .route("/api/files", get(handlers::list_files))
        .route("/api/schema", get(handlers::schema))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(build_cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Build a CORS layer for the configured origins ("*" allows any)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Serve the API on `bind` until Ctrl-C or SIGTERM
pub async fn start_server(
    orchestrator: Arc<BatchOrchestrator>,
    bind: SocketAddr,
    cors_origins: &[String],
    retention: Option<Duration>,
) -> std::io::Result<()> {
    let state = AppState::new(orchestrator);

    if let Some(age) = retention {
        tokio::spawn(retention_task(state.store.clone(), age));
    }

    let app = create_router(state, cors_origins);
    let listener = TcpListener::bind(bind).await?;

    tracing::info!(address = %listener.local_addr()?, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

/// Periodically delete stored files older than `age`
async fn retention_task(store: FileStore, age: Duration) {
    let period = age.clamp(Duration::from_secs(60), MAX_SWEEP_INTERVAL);
    let mut interval = tokio::time::interval(period);
    tracing::info!(
        max_age_secs = age.as_secs(),
        period_secs = period.as_secs(),
        "retention sweep enabled"
    );

    loop {
        interval.tick().await;
        if let Err(e) = store.remove_older_than(age).await {
            tracing::warn!(error = %e, "retention sweep failed");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
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
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
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

    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests;
