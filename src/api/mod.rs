//! REST API module using Axum
//!
//! HTTP surface of the engine. All responses use the `{data, meta}` /
//! `{error, meta}` envelope from [`envelope`].

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::AppState;

use axum::http::{header, HeaderName, Method};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `LEAD_ENGINE_CORS_ORIGINS` to a comma-separated list of allowed origins
/// for the storefront/admin front-end.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(handlers::ROLE_HEADER),
            HeaderName::from_static(handlers::USER_HEADER),
        ]);

    match std::env::var("LEAD_ENGINE_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

/// Create the complete application router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::root_routes(state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer())
}
