use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use common::protocol::{
    ErrorResponse, HandshakePayload, MessagePayload, PeerTransport, TransportError,
};

use crate::http_server::api::client::{ApiClient, ApiError};

/// Reaches the peer over its HTTP API.
///
/// Every request carries the configured timeout; nothing is retried here.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ApiClient,
}

impl HttpTransport {
    pub fn new(peer_url: &Url, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::with_timeout(peer_url, timeout)?,
        })
    }

    pub fn peer_url(&self) -> &Url {
        self.client.base_url()
    }
}

fn to_transport(err: ApiError) -> TransportError {
    match err {
        ApiError::HttpStatus(status, body) => TransportError::Rejected {
            status: status.as_u16(),
            // peers answer errors with {"erro": ...}
            body: serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.erro)
                .unwrap_or(body),
        },
        err if err.is_timeout() => TransportError::Timeout,
        err => TransportError::Network(err.to_string()),
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn handshake(
        &self,
        payload: HandshakePayload,
    ) -> Result<HandshakePayload, TransportError> {
        tracing::debug!(peer = %self.peer_url(), "posting handshake");
        self.client.call(payload).await.map_err(to_transport)
    }

    async fn deliver(&self, payload: MessagePayload) -> Result<(), TransportError> {
        tracing::debug!(peer = %self.peer_url(), "posting message");
        self.client
            .call(payload)
            .await
            .map(|_| ())
            .map_err(to_transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_errors_become_rejections() {
        let err = to_transport(ApiError::HttpStatus(
            StatusCode::BAD_REQUEST,
            r#"{"erro":"invalid signature"}"#.to_string(),
        ));
        assert_eq!(
            err,
            TransportError::Rejected {
                status: 400,
                body: "invalid signature".to_string()
            }
        );

        let err = to_transport(ApiError::HttpStatus(
            StatusCode::BAD_GATEWAY,
            "upstream down".to_string(),
        ));
        assert_eq!(
            err,
            TransportError::Rejected {
                status: 502,
                body: "upstream down".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_a_network_error() {
        // nothing listens on port 9 on loopback
        let url = Url::parse("http://127.0.0.1:9").unwrap();
        let transport = HttpTransport::new(&url, Duration::from_secs(2)).unwrap();
        let err = transport
            .handshake(HandshakePayload::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Network(_) | TransportError::Timeout
        ));
    }
}
