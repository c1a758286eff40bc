use std::time::Duration;
use std::{fs, path::PathBuf};

use common::crypto::{CryptoMode, KeyPair, DEFAULT_KEY_BITS};
use common::protocol::{AuthMode, NodeConfig, RetryPolicy, DEFAULT_USER};
use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = "parley";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the local API (peer + chat endpoints)
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Base URL of the other node's API
    #[serde(default = "default_peer_url")]
    pub peer_url: Url,
    /// Name attached to outgoing messages
    #[serde(default = "default_user")]
    pub user: String,
    /// Modulus size used by `init` when generating the key
    #[serde(default = "default_key_bits")]
    pub key_bits: u64,
    #[serde(default)]
    pub crypto_mode: CryptoMode,
    #[serde(default)]
    pub auth_mode: AuthMode,
    #[serde(default = "default_max_handshake_attempts")]
    pub max_handshake_attempts: u32,
    #[serde(default = "default_handshake_retry_delay_ms")]
    pub handshake_retry_delay_ms: u64,
    /// Timeout for every request to the peer
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Start a handshake as soon as the daemon is up
    #[serde(default = "default_handshake_on_start")]
    pub handshake_on_start: bool,
}

fn default_api_port() -> u16 {
    5000
}

fn default_peer_url() -> Url {
    Url::parse("http://127.0.0.1:5001").expect("hardcoded URL must parse")
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

fn default_key_bits() -> u64 {
    DEFAULT_KEY_BITS
}

fn default_max_handshake_attempts() -> u32 {
    5
}

fn default_handshake_retry_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_handshake_on_start() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            peer_url: default_peer_url(),
            user: default_user(),
            key_bits: default_key_bits(),
            crypto_mode: CryptoMode::default(),
            auth_mode: AuthMode::default(),
            max_handshake_attempts: default_max_handshake_attempts(),
            handshake_retry_delay_ms: default_handshake_retry_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            handshake_on_start: default_handshake_on_start(),
        }
    }
}

impl AppConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_handshake_attempts,
            Duration::from_millis(self.handshake_retry_delay_ms),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn node_config(&self) -> NodeConfig {
        NodeConfig {
            user: self.user.clone(),
            crypto_mode: self.crypto_mode,
            auth_mode: self.auth_mode,
            retry: self.retry_policy(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the parley directory (~/.parley)
    pub parley_dir: PathBuf,
    /// Path to the node key PEM file
    pub key_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the parley directory path (custom or default ~/.parley)
    pub fn parley_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory: generate the key pair and write both files.
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let parley_dir = Self::parley_dir(custom_path)?;

        if parley_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }
        fs::create_dir_all(&parley_dir)?;

        let config = config.unwrap_or_default();

        // Generate and save key
        let key = KeyPair::generate(config.key_bits)
            .map_err(|e| StateError::InvalidKey(e.to_string()))?;
        let key_path = parley_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let config_path = parley_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            parley_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the parley directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let parley_dir = Self::parley_dir(custom_path)?;

        if !parley_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = parley_dir.join(KEY_FILE_NAME);
        let config_path = parley_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            parley_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load the key pair from the key file
    pub fn load_key(&self) -> Result<KeyPair, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = KeyPair::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("parley directory not initialized. Run 'parley init' first")]
    NotInitialized,

    #[error("parley directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
