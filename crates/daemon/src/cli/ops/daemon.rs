use clap::Args;
use url::Url;

use parley_daemon::state::AppState;
use parley_daemon::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override API server port (default from config)
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Override the peer's API URL (default from config)
    #[arg(long)]
    pub peer_url: Option<Url>,

    /// Override the user name (default from config)
    #[arg(long)]
    pub user: Option<String>,

    /// Skip the handshake normally attempted at startup
    #[arg(long)]
    pub no_handshake: bool,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] parley_daemon::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let key_pair = state.load_key()?;

        let mut config = ServiceConfig::from_app_config(&state.config);
        config.key_pair = Some(key_pair);
        config.log_dir = self.log_dir.clone();
        if let Some(port) = self.api_port {
            config.api_port = port;
        }
        if let Some(url) = &self.peer_url {
            config.peer_url = url.clone();
        }
        if let Some(user) = &self.user {
            config.node.user = user.clone();
        }
        if self.no_handshake {
            config.handshake_on_start = false;
        }

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
