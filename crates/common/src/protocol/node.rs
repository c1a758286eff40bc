use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::crypto::{CryptoMode, KeyPair};

use super::events::EventSink;
use super::retry::RetryPolicy;
use super::session::Session;
use super::transport::PeerTransport;

/// Sender name used when none is configured or a peer omits one
pub const DEFAULT_USER: &str = "anonymous";

/// How messages are authenticated
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// RSA signature with the sender's private key
    #[default]
    Signature,
    /// HMAC-SHA-256 keyed by the secret agreed during the handshake
    SharedSecret,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Signature => f.write_str("signature"),
            AuthMode::SharedSecret => f.write_str("shared_secret"),
        }
    }
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signature" => Ok(AuthMode::Signature),
            "shared_secret" | "mac" => Ok(AuthMode::SharedSecret),
            other => Err(format!("unknown auth mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Name attached to outgoing messages
    pub user: String,
    pub crypto_mode: CryptoMode,
    pub auth_mode: AuthMode,
    /// Governs `initiate_handshake` only; messages are sent once
    pub retry: RetryPolicy,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            crypto_mode: CryptoMode::default(),
            auth_mode: AuthMode::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// One end of a conversation: a session plus the means to reach the peer and report events.
///
/// Cheap to clone; all clones share the same session.
#[derive(Clone)]
pub struct Node {
    pub(crate) session: Arc<Session>,
    pub(crate) config: Arc<NodeConfig>,
    pub(crate) transport: Arc<dyn PeerTransport>,
    pub(crate) events: Arc<dyn EventSink>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("user", &self.config.user)
            .field("session", &self.session)
            .finish()
    }
}

impl Node {
    pub fn new(
        key_pair: Arc<KeyPair>,
        config: NodeConfig,
        transport: Arc<dyn PeerTransport>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            session: Arc::new(Session::new(key_pair)),
            config: Arc::new(config),
            transport,
            events,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn user(&self) -> &str {
        &self.config.user
    }
}
