use clap::Args;

use parley_daemon::http_server::api::client::ApiError;
use parley_daemon::http_server::api::v0::chat::SessionRequest;

#[derive(Args, Debug, Clone)]
pub struct Session;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Session {
    type Error = SessionError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let session = ctx.client.call(SessionRequest::default()).await?;
        Ok(session.to_string())
    }
}
