use clap::Args;

use common::prelude::HandshakeStatus;
use parley_daemon::http_server::api::client::ApiError;
use parley_daemon::http_server::api::v0::chat::InitiateRequest;

/// Ask the local node to handshake with its peer
#[derive(Args, Debug, Clone)]
pub struct Handshake;

#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Handshake {
    type Error = HandshakeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let outcome = ctx.client.call(InitiateRequest::default()).await?;

        Ok(match (outcome.status, outcome.attempts) {
            (HandshakeStatus::Established, 0) => "session already established".to_string(),
            (status, 0) => format!("handshake already running ({})", status),
            (status, attempts) => format!("handshake {} after {} attempt(s)", status, attempts),
        })
    }
}
