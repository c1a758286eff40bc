use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::protocol::HandshakeOutcome;

use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitiateRequest {}

/// Run the initiator side of the handshake to completion, retries included.
///
/// Always 200: a handshake that ran out of attempts is reported as `failed` in the body.
pub async fn handler(State(state): State<ServiceState>) -> impl IntoResponse {
    let outcome = state.node().initiate_handshake().await;
    tracing::info!(
        status = %outcome.status,
        attempts = outcome.attempts,
        "handshake requested locally"
    );
    (http::StatusCode::OK, Json(outcome))
}

impl ApiRequest for InitiateRequest {
    type Response = HandshakeOutcome;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/chat/handshake").unwrap();
        client.post(full_url).json(&self)
    }
}
