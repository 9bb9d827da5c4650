//! Route definitions and router construction.
//!
//! # Path Parameter Syntax
//! Axum 0.8 uses brace syntax for path parameters: `{job_id}`, `{run_id}`

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::require_api_key;
use crate::bootstrap::{AxumContext, CorsConfig};
use crate::handlers;
use crate::request_id::{MakeRequestUuid, X_REQUEST_ID, request_span, stamp_error_bodies};
use crate::state::AppState;

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// The authenticated `/v1` API, without state or auth applied.
pub(crate) fn api_routes() -> Router<AppState> {
    Router::new()
        // Jobs
        .route("/jobs", get(handlers::jobs::list))
        .route("/jobs/{job_id}/runs", post(handlers::jobs::trigger))
        // Runs
        .route("/runs/{run_id}", get(handlers::runs::get))
        .route("/runs/{run_id}/events", get(handlers::runs::events))
        .route("/runs/{run_id}/cancel", post(handlers::runs::cancel))
        // Discovery
        .route("/discovery/teams", get(handlers::discovery::teams))
        .route("/discovery/pipelines", get(handlers::discovery::pipelines))
        .route(
            "/discovery/pipelines/{pipeline}/jobs",
            get(handlers::discovery::pipeline_jobs),
        )
        .route(
            "/discovery/pipelines/{pipeline}/jobs/{job}/builds",
            get(handlers::discovery::job_builds),
        )
        .route("/builds/{build_id}", get(handlers::discovery::build_details))
}

/// Create the main Axum router.
///
/// `/health` and `/health/ready` are public; everything under `/v1` requires
/// an API key. Every response carries `X-Request-ID`.
pub fn create_router(ctx: AxumContext, cors_config: &CorsConfig) -> Router {
    let keys = ctx.api_keys.clone();
    let state: AppState = Arc::new(ctx);

    let auth_layer = middleware::from_fn(move |req, next| {
        let keys = keys.clone();
        async move { require_api_key(keys, req, next).await }
    });

    Router::new()
        .route("/health", get(handlers::health::live))
        .route("/health/ready", get(handlers::health::ready))
        .nest("/v1", api_routes().route_layer(auth_layer))
        .with_state(state)
        .layer(middleware::from_fn(stamp_error_bodies))
        .layer(build_cors_layer(cors_config))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), MakeRequestUuid))
}
