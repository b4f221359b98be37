//! REST API module using Axum
//!
//! Thin HTTP adapter over [`crate::pipeline::PredictionService`].

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::ApiState;

use axum::http::{header, HeaderValue, Method, Uri};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use envelope::{ApiError, ErrorCode};

async fn not_found(uri: Uri) -> ApiError {
    ApiError::new(ErrorCode::NotFound, format!("No route for {}", uri.path()))
}

/// Build a CORS layer from the configured origins.
///
/// An empty list allows no cross-origin callers; `"*"` allows any.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.iter().any(|o| o.trim() == "*") {
        tracing::info!("CORS: allowing any origin");
        return layer.allow_origin(AllowOrigin::any());
    }
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.trim().parse().ok()).collect();
    if !allowed.is_empty() {
        tracing::info!(origins = ?origins, "CORS: allowing configured origins");
    }
    layer.allow_origin(allowed)
}

/// Create the application router.
pub fn create_app(state: ApiState, cors_origins: &[String]) -> Router {
    routes::api_routes(state)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origins))
}
