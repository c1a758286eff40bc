//! Cryptographic primitives for Parley
//!
//! Everything a node needs to hold a private conversation with a single peer:
//!
//! - **Hashing**: a self-contained SHA-256 ([`sha256`]) used by every other primitive
//! - **Keys**: RSA key generation over Miller–Rabin primes ([`KeyPair`], [`PublicKey`])
//! - **Encryption and signatures**: RSA in either [`CryptoMode::Padded`] (OAEP + PSS) or the
//!   legacy [`CryptoMode::Raw`] form
//! - **Message authentication**: HMAC-SHA-256 keyed by a [`SharedSecret`]
//!
//! # Security Model
//!
//! ## Identity
//! Each node generates an RSA key pair once and keeps it for the life of the process (or
//! on disk in `key.pem`). The public half is exchanged during the handshake with no
//! certificate or fingerprint check, so the first key a node hears is the one it trusts.
//!
//! ## Confidentiality
//! Messages are encrypted to the peer's public key. In padded mode long messages are split
//! into independent OAEP blocks.
//!
//! ## Authenticity
//! Either an RSA signature with the sender's private key or an HMAC tag keyed by the
//! shared secret, computed over the plaintext. The shared secret travels in the clear in the
//! handshake request, so MAC mode only protects against peers who did not see the handshake.
//!
//! All failures on the receiving side fail closed and never surface partial plaintext.

pub mod bigint;
mod compare;
pub mod hmac;
mod keys;
pub mod oaep;
pub mod prime;
pub mod pss;
mod rsa;
mod secret;
pub mod sha256;

pub use compare::constant_time_eq;
pub use keys::{KeyError, KeyPair, PublicKey, DEFAULT_KEY_BITS, MIN_KEY_BITS, PUBLIC_EXPONENT};
pub use rsa::CryptoMode;
pub use secret::{SecretError, SharedSecret, SECRET_SIZE};
pub use sha256::sha256;

/// Errors from encryption, decryption, signing and tag verification
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("modulus of {0} bytes is too small for this operation")]
    KeyTooSmall(usize),
    #[error("message block of {len} bytes exceeds the {max} byte limit")]
    MessageTooLong { len: usize, max: usize },
    #[error("value out of range for the modulus")]
    OutOfRange,
    #[error("decryption failed")]
    Decryption,
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid message authentication code")]
    InvalidMac,
}
