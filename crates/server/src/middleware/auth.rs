//! Bearer authentication for the collection endpoint.

#![allow(clippy::missing_errors_doc)]

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

const BEARER_PREFIX: &str = "Bearer ";

/// Validates `Authorization: Bearer <secret>` against the configured secret.
///
/// # Security
///
/// - If no secret is configured (`None`), every request is rejected.
/// - Uses `subtle::ConstantTimeEq` for the comparison.
/// - Returns `401 Unauthorized` for a missing, malformed or wrong token.
///
/// # Example
///
/// ```rust,ignore
/// let secret = Some(Arc::new("secret".to_string()));
/// let router = Router::new()
///     .route("/metrics/{blockchain}", get(handler))
///     .layer(middleware::from_fn_with_state(secret, bearer_auth_middleware));
/// ```
pub async fn bearer_auth_middleware(
    State(api_secret): State<Option<Arc<String>>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = api_secret.filter(|s| !s.is_empty()) else {
        warn!("api secret not configured, rejecting request");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if provided.as_bytes().ct_eq(expected.as_bytes()).into() {
        Ok(next.run(request).await)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}
