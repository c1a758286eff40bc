use std::path::PathBuf;
use std::time::Duration;

use common::crypto::KeyPair;
use common::protocol::NodeConfig;
use url::Url;

use crate::state::AppConfig;

#[derive(Debug, Clone)]
pub struct Config {
    // identity
    /// the node's key pair,
    ///  if not set then a new one is generated at startup
    pub key_pair: Option<KeyPair>,
    /// modulus size for a generated key
    pub key_bits: u64,

    // protocol
    /// user name, crypto and auth modes, handshake retry policy
    pub node: NodeConfig,
    /// base URL of the other node's API
    pub peer_url: Url,
    /// timeout for each request to the peer
    pub request_timeout: Duration,
    /// run a handshake as soon as the server is up
    pub handshake_on_start: bool,

    // http server configuration
    /// Port for the API HTTP server (peer + chat routes).
    pub api_port: u16,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Service configuration from an on-disk config, with no key yet.
    pub fn from_app_config(app: &AppConfig) -> Self {
        Self {
            key_pair: None,
            key_bits: app.key_bits,
            node: app.node_config(),
            peer_url: app.peer_url.clone(),
            request_timeout: app.request_timeout(),
            handshake_on_start: app.handshake_on_start,
            api_port: app.api_port,
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}
