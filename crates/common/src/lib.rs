/**
 * Cryptographic primitives.
 *  - SHA-256 and HMAC
 *  - RSA key generation, encryption
 *    and signatures
 */
pub mod crypto;
/**
 * Session state, handshake and
 *  message exchange between two
 *  nodes, independent of transport.
 */
pub mod protocol;
/**
 * In-memory nodes and transports
 *  for exercising the protocol
 *  without a network.
 */
pub mod testkit;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::crypto::{CryptoMode, KeyPair, PublicKey, SharedSecret};
    pub use crate::protocol::{
        AuthMode, ChatEvent, HandshakeStatus, Node, NodeConfig, PeerTransport, ProtocolError,
    };
    pub use crate::version::build_info;
}
