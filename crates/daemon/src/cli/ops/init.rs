use clap::Args;
use url::Url;

use common::prelude::{AuthMode, CryptoMode};
use parley_daemon::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Port for this node's API server
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Base URL of the other node's API
    #[arg(long)]
    pub peer_url: Option<Url>,

    /// Name shown to the peer
    #[arg(long)]
    pub user: Option<String>,

    /// RSA modulus size in bits
    #[arg(long)]
    pub key_bits: Option<u64>,

    /// `padded` (OAEP/PSS) or `raw` (textbook RSA, compatibility only)
    #[arg(long)]
    pub crypto_mode: Option<CryptoMode>,

    /// `signature` or `shared_secret`
    #[arg(long)]
    pub auth_mode: Option<AuthMode>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
    #[error("key generation task failed: {0}")]
    KeyTask(String),
}

impl Init {
    fn app_config(&self) -> AppConfig {
        let defaults = AppConfig::default();
        AppConfig {
            api_port: self.api_port.unwrap_or(defaults.api_port),
            peer_url: self.peer_url.clone().unwrap_or(defaults.peer_url.clone()),
            user: self.user.clone().unwrap_or(defaults.user.clone()),
            key_bits: self.key_bits.unwrap_or(defaults.key_bits),
            crypto_mode: self.crypto_mode.unwrap_or(defaults.crypto_mode),
            auth_mode: self.auth_mode.unwrap_or(defaults.auth_mode),
            ..defaults
        }
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = self.app_config();
        let config_path = ctx.config_path.clone();

        // prime search for a 2048-bit key takes a while
        let state = tokio::task::spawn_blocking(move || AppState::init(config_path, Some(config)))
            .await
            .map_err(|e| InitError::KeyTask(e.to_string()))??;
        let fingerprint = state.load_key()?.public_key().fingerprint();

        let output = format!(
            "Initialized parley directory at: {}\n\
             - Key: {} ({} bits, fingerprint {})\n\
             - Config: {}\n\
             - API port: {}\n\
             - Peer: {}\n\
             - Modes: {} / {}",
            state.parley_dir.display(),
            state.key_path.display(),
            state.config.key_bits,
            fingerprint,
            state.config_path.display(),
            state.config.api_port,
            state.config.peer_url,
            state.config.crypto_mode,
            state.config.auth_mode,
        );

        Ok(output)
    }
}
