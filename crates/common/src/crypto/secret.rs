//! Symmetric secret shared between the two nodes of a session.
//!
//! The secret is only ever used as an HMAC key. It is proposed by the handshake initiator
//! and adopted verbatim by the responder, and it crosses the wire in the clear as part of
//! the handshake request.

use std::fmt;
use std::ops::Deref;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::bigint::fill_random;

/// Size of the shared secret in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("invalid secret size, expected 32 bytes, got {0}")]
    InvalidSize(usize),
    #[error("secret is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A 256-bit symmetric key used to authenticate messages with HMAC-SHA-256.
///
/// ```ignore
/// let secret = SharedSecret::generate();
/// let wire = secret.to_base64();
/// assert_eq!(SharedSecret::from_base64(&wire)?, secret);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret([u8; SECRET_SIZE]);

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

impl Deref for SharedSecret {
    type Target = [u8; SECRET_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SECRET_SIZE]> for SharedSecret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        SharedSecret(bytes)
    }
}

impl SharedSecret {
    /// Generate a new random secret using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut buff = [0; SECRET_SIZE];
        fill_random(&mut buff);
        Self(buff)
    }

    /// Create a secret from a byte slice of exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        let bytes: [u8; SECRET_SIZE] = data
            .try_into()
            .map_err(|_| SecretError::InvalidSize(data.len()))?;
        Ok(bytes.into())
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, SecretError> {
        let bytes = BASE64.decode(encoded.trim())?;
        Self::from_slice(&bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_generate_is_random() {
        assert_ne!(SharedSecret::generate(), SharedSecret::generate());
    }

    #[test]
    fn test_base64_round_trip() {
        let secret = SharedSecret::generate();
        let recovered = SharedSecret::from_base64(&secret.to_base64()).unwrap();
        assert_eq!(secret, recovered);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let short = BASE64.encode([1u8; 16]);
        assert!(matches!(
            SharedSecret::from_base64(&short),
            Err(SecretError::InvalidSize(16))
        ));
        assert!(SharedSecret::from_base64("not base64!").is_err());
    }

    #[test]
    fn test_debug_redacts() {
        let secret = SharedSecret::from([7u8; SECRET_SIZE]);
        assert_eq!(format!("{:?}", secret), "SharedSecret(<redacted>)");
    }
}
