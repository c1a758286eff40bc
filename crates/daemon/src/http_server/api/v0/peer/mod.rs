//! Endpoints the other node calls.

use axum::routing::post;
use axum::Router;

pub mod handshake;
pub mod message;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/handshake", post(handshake::handler))
        .route("/message", post(message::handler))
        .with_state(state)
}
