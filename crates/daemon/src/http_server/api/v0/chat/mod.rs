//! Endpoints for the local user: the CLI (or any other front end) drives the node through
//! these, and they in turn talk to the peer.

use axum::routing::{get, post};
use axum::Router;

pub mod handshake;
pub mod send;
pub mod session;

pub use handshake::InitiateRequest;
pub use send::SendRequest;
pub use session::{SessionRequest, SessionResponse};

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/send", post(send::handler))
        .route("/handshake", post(handshake::handler))
        .route("/session", get(session::handler))
        .with_state(state)
}
