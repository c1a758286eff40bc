use clap::Args;

use parley_daemon::http_server::api::client::ApiError;
use parley_daemon::http_server::api::v0::chat::SendRequest;

/// Send a message to the peer through the local node
#[derive(Args, Debug, Clone)]
pub struct SendMessage {
    /// Message text
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("message not sent: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for SendMessage {
    type Error = SendError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let request = SendRequest {
            text: self.text.clone(),
        };
        let response = ctx.client.call(request).await?;
        Ok(format!("sent ({})", response.status))
    }
}
