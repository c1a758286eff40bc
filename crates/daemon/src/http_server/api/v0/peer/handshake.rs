use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};

use common::protocol::{ErrorResponse, HandshakePayload, ProtocolError};

use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Answer a peer's handshake with our own public key (and the echoed shared secret).
pub async fn handler(
    State(state): State<ServiceState>,
    payload: Result<Json<HandshakePayload>, JsonRejection>,
) -> Result<impl IntoResponse, HandshakeError> {
    let Json(request) = payload?;
    tracing::info!(
        shared_key = request.shared_key.is_some(),
        "handshake request from peer"
    );

    let reply = state.node().handle_handshake(request)?;
    Ok((http::StatusCode::OK, Json(reply)))
}

#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl IntoResponse for HandshakeError {
    fn into_response(self) -> Response {
        tracing::warn!("handshake rejected: {}", self);
        (
            http::StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(self.to_string())),
        )
            .into_response()
    }
}

impl ApiRequest for HandshakePayload {
    type Response = HandshakePayload;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/peer/handshake").unwrap();
        client.post(full_url).json(&self)
    }
}
