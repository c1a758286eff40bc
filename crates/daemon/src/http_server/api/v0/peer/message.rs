use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};

use common::protocol::{ErrorResponse, MessagePayload, ProtocolError, StatusResponse};

use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Decrypt and verify a message from the peer. The plaintext reaches the event sink,
/// never the response.
pub async fn handler(
    State(state): State<ServiceState>,
    payload: Result<Json<MessagePayload>, JsonRejection>,
) -> Result<impl IntoResponse, MessageError> {
    let Json(request) = payload?;

    let message = state.node().receive_payload(&request)?;
    tracing::debug!(
        sender = %message.sender,
        tag = message.tag.kind(),
        "message accepted"
    );

    Ok((http::StatusCode::OK, Json(StatusResponse::ok())))
}

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl IntoResponse for MessageError {
    fn into_response(self) -> Response {
        tracing::warn!("message rejected: {}", self);
        (
            http::StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(self.to_string())),
        )
            .into_response()
    }
}

impl ApiRequest for MessagePayload {
    type Response = StatusResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/peer/message").unwrap();
        client.post(full_url).json(&self)
    }
}
