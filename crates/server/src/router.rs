use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pulse_core::{chains::Blockchain, config::ConfigError};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::AppState;

/// Liveness probe. Does not touch providers.
pub async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Runs one collection invocation for the chain named in the path and returns
/// the rendered payload.
pub async fn handle_collect(
    State(state): State<AppState>,
    Path(blockchain): Path<String>,
) -> Result<String, ApiError> {
    let blockchain: Blockchain = blockchain.parse()?;
    state.orchestrator.registry().ensure_registered(blockchain)?;

    let endpoints = state.endpoints.load()?;
    let report = state.orchestrator.run(blockchain, &endpoints).await?;

    info!(
        run_id = %report.run_id,
        blockchain = %blockchain,
        reported = report.reported,
        failed = report.failed,
        "collection request completed"
    );
    Ok(format!("{blockchain} metrics collection completed\n\nMetrics:\n{}", report.payload))
}

/// Configuration failure surfaced to the HTTP caller.
#[derive(Debug)]
pub struct ApiError(pub ConfigError);

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        Self(e)
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.0 {
            ConfigError::UnknownBlockchain { .. } | ConfigError::UnregisteredBlockchain { .. } => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(status = status.as_u16(), error = %self.0, "collection request failed");
        (status, self.0.to_string()).into_response()
    }
}
