use std::sync::Arc;

use common::crypto::{KeyError, KeyPair};
use common::protocol::{ChannelSink, Node};

use super::service_config::Config;
use super::transport::HttpTransport;
use crate::http_server::api::client::ApiError;

/// Main service state, shared by every request handler
#[derive(Clone, Debug)]
pub struct State {
    node: Node,
}

impl State {
    pub async fn from_config(config: &Config, events: ChannelSink) -> Result<Self, StateSetupError> {
        // 1. Setup node key
        let key_pair = match config.key_pair.clone() {
            Some(key_pair) => key_pair,
            None => {
                let bits = config.key_bits;
                tracing::info!(bits, "no key configured, generating one");
                tokio::task::spawn_blocking(move || KeyPair::generate(bits))
                    .await
                    .map_err(|e| StateSetupError::KeyTask(e.to_string()))??
            }
        };
        tracing::info!(
            fingerprint = %key_pair.public_key().fingerprint(),
            bits = key_pair.bit_length(),
            "node key loaded"
        );

        // 2. Setup transport to the peer
        let transport = HttpTransport::new(&config.peer_url, config.request_timeout)?;
        tracing::info!(
            peer_url = %config.peer_url,
            crypto_mode = %config.node.crypto_mode,
            auth_mode = %config.node.auth_mode,
            "peer transport configured"
        );

        // 3. Build the node around a fresh session
        let node = Node::new(
            Arc::new(key_pair),
            config.node.clone(),
            Arc::new(transport),
            Arc::new(events),
        );

        Ok(Self { node })
    }

    pub fn node(&self) -> &Node {
        &self.node
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("key generation failed: {0}")]
    Key(#[from] KeyError),
    #[error("key generation task failed: {0}")]
    KeyTask(String),
    #[error("failed to build peer client: {0}")]
    Transport(#[from] ApiError),
}
