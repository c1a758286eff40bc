use std::fmt;

use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::{AuthMode, CryptoMode, HandshakeStatus};

use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub status: HandshakeStatus,
    pub user: String,
    pub public_key: String,
    pub fingerprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_fingerprint: Option<String>,
    pub crypto_mode: CryptoMode,
    pub auth_mode: AuthMode,
}

impl fmt::Display for SessionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "status:      {}", self.status)?;
        writeln!(f, "user:        {}", self.user)?;
        writeln!(f, "key:         {}", self.fingerprint)?;
        writeln!(
            f,
            "peer key:    {}",
            self.peer_fingerprint.as_deref().unwrap_or("-")
        )?;
        writeln!(f, "crypto mode: {}", self.crypto_mode)?;
        write!(f, "auth mode:   {}", self.auth_mode)
    }
}

#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> impl IntoResponse {
    let node = state.node();
    let session = node.session();
    let public_key = session.public_key();
    let peer = session.peer_public_key();

    Json(SessionResponse {
        status: session.status(),
        user: node.user().to_string(),
        public_key: public_key.to_wire(),
        fingerprint: public_key.fingerprint(),
        peer_public_key: peer.as_ref().map(|key| key.to_wire()),
        peer_fingerprint: peer.as_ref().map(|key| key.fingerprint()),
        crypto_mode: node.config().crypto_mode,
        auth_mode: node.config().auth_mode,
    })
}

impl ApiRequest for SessionRequest {
    type Response = SessionResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/chat/session").unwrap();
        client.get(full_url)
    }
}
