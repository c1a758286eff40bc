//! Shared helpers for daemon integration tests
#![allow(dead_code)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use url::Url;

use ::common::protocol::{ChannelSink, ChatEvent, RetryPolicy};
use ::common::testkit::{test_key_pair, TestKey};
use parley_daemon::{ServiceConfig, ServiceState};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Config for a node using one of the shared test keys. Retries are short so a handshake
/// against a dead peer gives up quickly.
pub fn service_config(key: TestKey, user: &str, peer_url: Url) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.key_pair = Some(test_key_pair(key).clone());
    config.node.user = user.to_string();
    config.node.retry = RetryPolicy::new(2, Duration::from_millis(10));
    config.peer_url = peer_url;
    config.request_timeout = Duration::from_secs(2);
    config.handshake_on_start = false;
    config
}

/// Nothing listens on the discard port on loopback.
pub fn dead_peer() -> Url {
    Url::parse("http://127.0.0.1:9").unwrap()
}

pub async fn state(config: &ServiceConfig) -> (ServiceState, flume::Receiver<ChatEvent>) {
    init_tracing();
    let (sink, events) = ChannelSink::new();
    let state = ServiceState::from_config(config, sink).await.unwrap();
    (state, events)
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::ACCEPT, "application/json")
        .body(Body::empty())
        .unwrap()
}

pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
