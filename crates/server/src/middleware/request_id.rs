//! `x-request-id` handling so collection logs can be tied back to the caller.

use axum::http::{header::HeaderValue, HeaderName, Request};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates a UUID v4 request ID when the caller did not send one.
#[derive(Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string()).ok().map(RequestId::new)
    }
}

/// Layers that set `x-request-id` on the request and copy it to the response.
///
/// Apply `propagate` before `set` so it runs after it.
#[must_use]
pub fn request_id_layers() -> (SetRequestIdLayer<UuidRequestId>, PropagateRequestIdLayer) {
    (
        SetRequestIdLayer::new(X_REQUEST_ID.clone(), UuidRequestId),
        PropagateRequestIdLayer::new(X_REQUEST_ID.clone()),
    )
}

/// Request ID of `request`, or `-` if none was set.
#[must_use]
pub fn request_id_of<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}
