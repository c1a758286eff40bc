use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::crypto::{KeyPair, PublicKey, SharedSecret};

use super::ProtocolError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeStatus {
    #[default]
    Idle,
    InProgress,
    Established,
    Failed,
}

impl fmt::Display for HandshakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HandshakeStatus::Idle => "idle",
            HandshakeStatus::InProgress => "in_progress",
            HandshakeStatus::Established => "established",
            HandshakeStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default)]
struct SessionState {
    peer: Option<PublicKey>,
    shared_secret: Option<SharedSecret>,
    status: HandshakeStatus,
    // secret our own running handshake proposed
    proposal: Option<SharedSecret>,
}

/// Key material needed to send or receive, copied out of an established session
#[derive(Debug, Clone)]
pub struct EstablishedKeys {
    pub peer: PublicKey,
    pub shared_secret: Option<SharedSecret>,
}

/// The one conversation a node takes part in.
///
/// Holds the node's own key pair, whatever it has learned about its peer, and the handshake
/// status. All transitions go through the methods below and take the lock only for the
/// duration of the update.
pub struct Session {
    key_pair: Arc<KeyPair>,
    state: RwLock<SessionState>,
    // serialises initiators; never held by the responder
    handshake_lock: tokio::sync::Mutex<()>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Session")
            .field("public_key", &self.key_pair.public_key())
            .field("peer", &state.peer)
            .field("status", &state.status)
            .finish()
    }
}

impl Session {
    pub fn new(key_pair: Arc<KeyPair>) -> Self {
        Self {
            key_pair,
            state: RwLock::new(SessionState::default()),
            handshake_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn public_key(&self) -> PublicKey {
        self.key_pair.public_key()
    }

    pub fn status(&self) -> HandshakeStatus {
        self.state.read().status
    }

    pub fn peer_public_key(&self) -> Option<PublicKey> {
        self.state.read().peer.clone()
    }

    pub fn has_shared_secret(&self) -> bool {
        self.state.read().shared_secret.is_some()
    }

    pub(crate) fn handshake_lock(&self) -> &tokio::sync::Mutex<()> {
        &self.handshake_lock
    }

    /// Move to `InProgress` if no handshake is running and none has succeeded, remembering
    /// the secret this handshake proposes.
    ///
    /// Returns false (and changes nothing) from `InProgress` or `Established`.
    pub fn begin_handshake(&self, proposal: Option<SharedSecret>) -> bool {
        let mut state = self.state.write();
        match state.status {
            HandshakeStatus::Idle | HandshakeStatus::Failed => {
                state.status = HandshakeStatus::InProgress;
                state.proposal = proposal;
                true
            }
            HandshakeStatus::InProgress | HandshakeStatus::Established => false,
        }
    }

    /// Record the responder's key (and the agreed secret) and mark the session established.
    pub fn complete_handshake(&self, peer: PublicKey, shared_secret: Option<SharedSecret>) {
        let mut state = self.state.write();
        state.peer = Some(peer);
        state.shared_secret = shared_secret;
        state.status = HandshakeStatus::Established;
        state.proposal = None;
    }

    /// Give up on a running handshake. Only has an effect from `InProgress`.
    pub fn fail_handshake(&self) {
        let mut state = self.state.write();
        if state.status == HandshakeStatus::InProgress {
            state.status = HandshakeStatus::Failed;
            state.proposal = None;
        }
    }

    /// Responder side: adopt the initiator's key and proposed secret.
    ///
    /// When both nodes are proposing secrets at the same time, the node with the smaller
    /// modulus keeps its own proposal: it refuses the peer's with a state error, and the
    /// peer's initiator retries until it sees the session our proposal established. The
    /// check and the update happen under one lock, so an initiator completing concurrently
    /// cannot interleave with it.
    ///
    /// Applying the same request twice leaves the session as it was after the first.
    pub fn accept_peer(
        &self,
        peer: PublicKey,
        shared_secret: Option<SharedSecret>,
    ) -> Result<(), ProtocolError> {
        let mut state = self.state.write();
        let colliding = state.status == HandshakeStatus::InProgress
            && state.proposal.is_some()
            && shared_secret.is_some();
        if colliding && self.key_pair.modulus() < peer.modulus() {
            return Err(ProtocolError::state(
                "handshake collision: our own proposal takes precedence",
            ));
        }
        state.peer = Some(peer);
        state.shared_secret = shared_secret;
        state.status = HandshakeStatus::Established;
        state.proposal = None;
        Ok(())
    }

    /// Key material for sending or receiving; a state error unless established.
    pub fn established(&self) -> Result<EstablishedKeys, ProtocolError> {
        let state = self.state.read();
        if state.status != HandshakeStatus::Established {
            return Err(ProtocolError::state(format!(
                "handshake not established (status: {})",
                state.status
            )));
        }
        let peer = state
            .peer
            .clone()
            .ok_or_else(|| ProtocolError::state("no peer public key"))?;
        Ok(EstablishedKeys {
            peer,
            shared_secret: state.shared_secret.clone(),
        })
    }
}
