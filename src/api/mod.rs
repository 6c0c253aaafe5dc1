//! HTTP surface for plant analysis and AEP estimates.
//!
//! - `GET /`: liveness marker
//! - `GET /analysis`: SCADA summary, recomputed on every call
//! - `GET /analysis/aep?num_sim=N`: cached AEP distribution plus risk
//! - `GET /analysis/aep/cache`: populated cache entries

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::get;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::cache::ResultCache;
use crate::plant::PlantLoader;

pub use handlers::ApiError;

/// State shared by all request handlers.
///
/// The cache synchronizes internally; everything else is read-only.
pub struct AppState {
    pub cache: ResultCache,
    /// Source of the SCADA table for `/analysis`.
    pub loader: PlantLoader,
    pub cors_origins: Vec<String>,
}

/// Builds the axum router with all API routes, CORS, and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let origins: Vec<HeaderValue> = state
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/analysis", get(handlers::get_analysis))
        .route("/analysis/aep", get(handlers::get_aep))
        .route("/analysis/aep/cache", get(handlers::get_cache_status))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Binds to `addr` and serves until the server fails.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server stops
/// with an error.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "api server listening");
    axum::serve(listener, app).await
}
