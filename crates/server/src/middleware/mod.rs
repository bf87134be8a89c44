//! HTTP middleware for the collection entrypoint.

pub mod auth;
pub mod request_id;

pub use auth::bearer_auth_middleware;
pub use request_id::{request_id_layers, request_id_of, UuidRequestId, X_REQUEST_ID};
