use async_trait::async_trait;

use super::wire::{HandshakePayload, MessagePayload};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request to peer timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("peer rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// How a node reaches its peer.
///
/// The daemon implements this over HTTP; tests use the in-memory transports in
/// [`crate::testkit`]. Implementations enforce their own per-request timeout and never retry;
/// retrying is the caller's decision.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Send our handshake material and return the peer's.
    async fn handshake(&self, payload: HandshakePayload)
        -> Result<HandshakePayload, TransportError>;

    /// Deliver one encrypted message.
    async fn deliver(&self, payload: MessagePayload) -> Result<(), TransportError>;
}
