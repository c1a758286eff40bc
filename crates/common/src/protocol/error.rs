use crate::crypto::{CryptoError, KeyError, SecretError};

use super::transport::TransportError;

/// Everything that can go wrong while handshaking or exchanging messages.
///
/// Exhausting the handshake retries is not an error; it is reported as
/// [`HandshakeStatus::Failed`](super::HandshakeStatus::Failed).
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The peer sent something missing or malformed
    #[error("invalid request: {0}")]
    Validation(String),
    /// The operation is not allowed in the current session state
    #[error("invalid session state: {0}")]
    State(String),
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl ProtocolError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ProtocolError::Validation(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        ProtocolError::State(msg.into())
    }
}

impl From<KeyError> for ProtocolError {
    fn from(err: KeyError) -> Self {
        ProtocolError::Validation(format!("invalid public key: {}", err))
    }
}

impl From<SecretError> for ProtocolError {
    fn from(err: SecretError) -> Self {
        ProtocolError::Validation(format!("invalid shared key: {}", err))
    }
}
