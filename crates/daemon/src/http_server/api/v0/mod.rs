use axum::Router;

pub mod chat;
pub mod peer;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/peer", peer::router(state.clone()))
        .nest("/chat", chat::router(state.clone()))
        .with_state(state)
}
