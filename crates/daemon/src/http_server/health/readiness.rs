use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

use crate::ServiceState;

/// Ready as soon as the node exists; the handshake status is reported but a node that has
/// not reached its peer yet still accepts handshakes.
#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    let handshake = state.node().session().status();
    let msg = serde_json::json!({"status": "ok", "handshake": handshake});
    (StatusCode::OK, Json(msg)).into_response()
}
