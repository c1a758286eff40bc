//! Handshake and message protocol between two nodes.
//!
//! A [`Node`] owns one [`Session`]. Before anything can be exchanged the nodes run a
//! handshake: the initiator posts its public key (and, in [`AuthMode::SharedSecret`], a
//! freshly generated secret) and the responder answers with its own key, echoing the secret.
//! After that either side can send messages:
//!
//! ```text
//!   sender                                         receiver
//!   ------                                         --------
//!   c = Encrypt(peer_pk, m)
//!   t = Sign(sk, m)  |  HMAC(secret, m)
//!   emit Sent(m)
//!   deliver {c, t, user}  ───────────────────────▶  m = Decrypt(sk, c)
//!                                                   Verify(peer_pk, m, t) | HMAC check
//!                                                   emit Received(m)
//! ```
//!
//! The shared secret crosses the wire in the clear during the handshake; it authenticates
//! messages against tampering by third parties that did not see the handshake, nothing more.
//!
//! Nodes talk through a [`PeerTransport`] and report to an [`EventSink`], so the same logic
//! runs over HTTP in the daemon and in memory in the [`testkit`](crate::testkit).

mod error;
mod events;
mod handshake;
mod message;
mod node;
mod retry;
mod session;
mod transport;
mod wire;

pub use error::ProtocolError;
pub use events::{ChannelSink, ChatEvent, Direction, EventSink};
pub use handshake::HandshakeOutcome;
pub use message::Message;
pub use node::{AuthMode, Node, NodeConfig, DEFAULT_USER};
pub use retry::{RetryExhausted, RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
pub use session::{EstablishedKeys, HandshakeStatus, Session};
pub use transport::{PeerTransport, TransportError};
pub use wire::{ErrorResponse, HandshakePayload, MessagePayload, MessageTag, StatusResponse};
