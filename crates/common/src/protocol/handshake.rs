use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::crypto::{PublicKey, SharedSecret};

use super::node::{AuthMode, Node};
use super::session::HandshakeStatus;
use super::wire::HandshakePayload;
use super::ProtocolError;

/// Result of [`Node::initiate_handshake`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeOutcome {
    pub status: HandshakeStatus,
    /// Requests actually sent; zero when the call was a no-op
    pub attempts: u32,
}

impl Node {
    /// Exchange public keys (and in shared-secret mode, a secret) with the peer.
    ///
    /// Does nothing when the session is already established or another handshake is running.
    /// Otherwise retries according to the configured policy and leaves the session either
    /// `Established` or `Failed`. Transport failures are logged, not returned.
    pub async fn initiate_handshake(&self) -> HandshakeOutcome {
        let Ok(_guard) = self.session.handshake_lock().try_lock() else {
            return self.noop_outcome();
        };
        let proposed = match self.config.auth_mode {
            AuthMode::SharedSecret => Some(SharedSecret::generate()),
            AuthMode::Signature => None,
        };
        if !self.session.begin_handshake(proposed.clone()) {
            return self.noop_outcome();
        }
        let request = HandshakePayload {
            public_key: Some(self.session.public_key().to_wire()),
            shared_key: proposed.as_ref().map(SharedSecret::to_base64),
        };

        tracing::info!(
            max_attempts = self.config.retry.max_attempts,
            auth_mode = %self.config.auth_mode,
            "starting handshake"
        );

        let sent = AtomicU32::new(0);
        let (request, proposed, sent) = (&request, proposed.as_ref(), &sent);
        let result = self
            .config
            .retry
            .run(move |attempt| {
                let request = request.clone();
                async move {
                    // the peer may have handshaken with us in the meantime
                    if attempt > 1 && self.session.status() == HandshakeStatus::Established {
                        tracing::debug!("session established by peer, stopping");
                        return Ok(());
                    }
                    sent.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(attempt, "sending handshake request");
                    let response = self.transport.handshake(request).await?;
                    self.accept_response(response, proposed)
                }
            })
            .await;

        match result {
            Ok(_) => HandshakeOutcome {
                status: self.session.status(),
                attempts: sent.load(Ordering::Relaxed),
            },
            Err(exhausted) => {
                self.session.fail_handshake();
                tracing::error!(
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "handshake failed"
                );
                HandshakeOutcome {
                    status: self.session.status(),
                    attempts: sent.load(Ordering::Relaxed),
                }
            }
        }
    }

    fn noop_outcome(&self) -> HandshakeOutcome {
        HandshakeOutcome {
            status: self.session.status(),
            attempts: 0,
        }
    }

    fn accept_response(
        &self,
        response: HandshakePayload,
        proposed: Option<&SharedSecret>,
    ) -> Result<(), ProtocolError> {
        let peer = parse_public_key(response.public_key.as_deref())?;

        if let Some(proposed) = proposed {
            let echoed = response
                .shared_key
                .as_deref()
                .ok_or_else(|| ProtocolError::validation("peer did not echo the shared key"))
                .and_then(|s| SharedSecret::from_base64(s).map_err(ProtocolError::from))?;
            if &echoed != proposed {
                return Err(ProtocolError::validation(
                    "peer echoed a different shared key",
                ));
            }
        }

        tracing::info!(peer = %peer.fingerprint(), "handshake established");
        self.session.complete_handshake(peer, proposed.cloned());
        Ok(())
    }

    /// Responder side of the handshake.
    ///
    /// Stores the initiator's key, adopts any proposed secret and replies with our own key
    /// (echoing the secret). Repeating the same request is harmless.
    ///
    /// If both nodes initiate at once in shared-secret mode, one of them refuses the other's
    /// proposal (see [`Session::accept_peer`](super::Session::accept_peer)) so both end up
    /// with the same secret.
    pub fn handle_handshake(
        &self,
        payload: HandshakePayload,
    ) -> Result<HandshakePayload, ProtocolError> {
        let peer = parse_public_key(payload.public_key.as_deref())?;

        let shared_secret = match (payload.shared_key.as_deref(), self.config.auth_mode) {
            (Some(encoded), _) => Some(SharedSecret::from_base64(encoded)?),
            (None, AuthMode::SharedSecret) => {
                return Err(ProtocolError::validation("missing field: shared_key"))
            }
            (None, AuthMode::Signature) => None,
        };

        tracing::info!(peer = %peer.fingerprint(), "accepted handshake from peer");
        let reply = HandshakePayload {
            public_key: Some(self.session.public_key().to_wire()),
            shared_key: shared_secret.as_ref().map(SharedSecret::to_base64),
        };
        self.session.accept_peer(peer, shared_secret)?;
        Ok(reply)
    }
}

fn parse_public_key(value: Option<&str>) -> Result<PublicKey, ProtocolError> {
    let value = value.ok_or_else(|| ProtocolError::validation("missing field: public_key"))?;
    Ok(value.parse::<PublicKey>()?)
}
