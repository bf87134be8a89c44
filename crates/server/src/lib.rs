//! HTTP entrypoint: `GET /metrics/{blockchain}` runs one collection invocation.

pub mod middleware;
pub mod router;

use axum::{body::Body, http::Request, middleware as axum_middleware, routing::get, Router};
use pulse_core::{config::EndpointsSource, pipeline::CollectionOrchestrator};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info_span;

/// Shared state of the HTTP entrypoint.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<CollectionOrchestrator>,
    pub endpoints: EndpointsSource,
    /// Bearer secret. `None` rejects every collection request.
    pub api_secret: Option<Arc<String>>,
}

/// Builds the router. `/health` is public; `/metrics/{blockchain}` requires
/// the bearer secret.
pub fn create_router(state: AppState) -> Router {
    let (set_request_id, propagate_request_id) = middleware::request_id_layers();

    let collect = Router::new()
        .route("/metrics/{blockchain}", get(router::handle_collect))
        .route_layer(axum_middleware::from_fn_with_state(
            state.api_secret.clone(),
            middleware::bearer_auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .route("/health", get(router::handle_health))
        .merge(collect)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            info_span!(
                "http",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %middleware::request_id_of(request),
            )
        }))
        .layer(propagate_request_id)
        .layer(set_request_id)
}
