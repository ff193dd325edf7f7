//! HTTP upload service
//!
//! Serves the modernization pipeline over axum. Each request runs its own
//! pipeline execution; the pipeline itself is shared read-only.
//!
//! ```bash
//! curl -F file=@customers.csv http://127.0.0.1:3000/api/modernize
//! curl http://127.0.0.1:3000/api/health
//! ```

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::llm::GenerationClient;
use crate::pipeline::ModernizationPipeline;

pub use error::{ErrorBody, ServiceError};
pub use routes::{AppState, HealthResponse, UPLOAD_FIELD};

/// Build the router with CORS, tracing and the configured body limit
pub fn build_router<C: GenerationClient + 'static>(
    pipeline: Arc<ModernizationPipeline<C>>,
) -> Router {
    let max_upload_bytes = pipeline.config().server.max_upload_bytes;

    Router::new()
        .route("/api/modernize", post(routes::modernize::<C>))
        .route("/api/health", get(routes::health::<C>))
        .with_state(AppState::new(pipeline))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Serve the router on an already bound listener until the process stops
pub async fn serve<C: GenerationClient + 'static>(
    pipeline: Arc<ModernizationPipeline<C>>,
    listener: TcpListener,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Modernizer service listening");
    }
    axum::serve(listener, build_router(pipeline)).await
}
