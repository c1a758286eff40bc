use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::protocol::{ErrorResponse, ProtocolError, StatusResponse, TransportError};

use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    /// Text to send to the peer
    #[serde(rename = "mensagem")]
    pub text: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<impl IntoResponse, SendError> {
    let Json(request) = payload?;

    let message = state.node().send_message(&request.text).await?;
    tracing::debug!(
        bytes = message.ciphertext.len(),
        tag = message.tag.kind(),
        "message delivered"
    );

    Ok((StatusCode::OK, Json(StatusResponse::ok())))
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl SendError {
    fn status(&self) -> StatusCode {
        match self {
            SendError::Protocol(ProtocolError::Transport(err)) => match err {
                TransportError::Timeout => StatusCode::REQUEST_TIMEOUT,
                TransportError::Network(_) => StatusCode::INTERNAL_SERVER_ERROR,
                TransportError::Rejected { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
            },
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for SendError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(status = status.as_u16(), "send failed: {}", self);
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

impl ApiRequest for SendRequest {
    type Response = StatusResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/chat/send").unwrap();
        client.post(full_url).json(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(err: TransportError) -> SendError {
        SendError::Protocol(ProtocolError::Transport(err))
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            SendError::Protocol(ProtocolError::state("no session")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            transport(TransportError::Timeout).status(),
            StatusCode::REQUEST_TIMEOUT
        );
        assert_eq!(
            transport(TransportError::Network("connection refused".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            transport(TransportError::Rejected {
                status: 403,
                body: "nope".into()
            })
            .status(),
            StatusCode::FORBIDDEN
        );
    }
}
