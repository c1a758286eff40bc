//! Route-level tests against a single node, driven through `tower::ServiceExt::oneshot`

mod common;

use axum::http::StatusCode;
use tower::ServiceExt;

use ::common::protocol::{HandshakePayload, HandshakeStatus};
use ::common::testkit::{test_key_pair, TestKey};
use parley_daemon::http_server;

use common::{dead_peer, get, json_body, post_json, service_config, state};

#[tokio::test]
async fn test_status_routes() {
    let (state, _events) = state(&service_config(TestKey::Alice, "alice", dead_peer())).await;
    let app = http_server::router(state);

    let response = app.clone().oneshot(get("/_status/livez")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/_status/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["handshake"], "idle");

    let response = app.oneshot(get("/_status/version")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await["version"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (state, _events) = state(&service_config(TestKey::Alice, "alice", dead_peer())).await;
    let response = http_server::router(state)
        .oneshot(get("/api/v0/nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["erro"], "not found");
}

#[tokio::test]
async fn test_malformed_bodies_are_400() {
    let (state, _events) = state(&service_config(TestKey::Alice, "alice", dead_peer())).await;
    let app = http_server::router(state);

    for uri in [
        "/api/v0/peer/handshake",
        "/api/v0/peer/message",
        "/api/v0/chat/send",
    ] {
        let response = app
            .clone()
            .oneshot(post_json(uri, "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert!(json_body(response).await["erro"].is_string(), "{}", uri);
    }
}

#[tokio::test]
async fn test_handshake_without_public_key_is_rejected() {
    let (state, _events) = state(&service_config(TestKey::Alice, "alice", dead_peer())).await;
    let response = http_server::router(state.clone())
        .oneshot(post_json("/api/v0/peer/handshake", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.node().session().status(), HandshakeStatus::Idle);
}

#[tokio::test]
async fn test_peer_handshake_establishes_the_responder() {
    let (state, _events) = state(&service_config(TestKey::Alice, "alice", dead_peer())).await;
    let bob_key = test_key_pair(TestKey::Bob).public_key();
    let request = HandshakePayload {
        public_key: Some(bob_key.to_wire()),
        shared_key: None,
    };

    let response = http_server::router(state.clone())
        .oneshot(post_json(
            "/api/v0/peer/handshake",
            &serde_json::to_string(&request).unwrap(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let reply: HandshakePayload = serde_json::from_value(json_body(response).await).unwrap();
    assert_eq!(
        reply.public_key.unwrap(),
        test_key_pair(TestKey::Alice).public_key().to_wire()
    );
    assert_eq!(state.node().session().peer_public_key(), Some(bob_key));
}

#[tokio::test]
async fn test_send_before_handshake_is_a_state_error() {
    let (state, events) = state(&service_config(TestKey::Alice, "alice", dead_peer())).await;
    let response = http_server::router(state)
        .oneshot(post_json("/api/v0/chat/send", r#"{"mensagem":"hello"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_message_before_handshake_is_rejected() {
    let (state, events) = state(&service_config(TestKey::Alice, "alice", dead_peer())).await;
    let body = r#"{"mensagem":"AAAA","assinatura":"AAAA","usuario":"bob"}"#;
    let response = http_server::router(state)
        .oneshot(post_json("/api/v0/peer/message", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_session_reports_identity_and_modes() {
    let (state, _events) = state(&service_config(TestKey::Alice, "alice", dead_peer())).await;
    let response = http_server::router(state)
        .oneshot(get("/api/v0/chat/session"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "idle");
    assert_eq!(body["user"], "alice");
    assert_eq!(body["crypto_mode"], "padded");
    assert_eq!(body["auth_mode"], "signature");
    assert_eq!(
        body["public_key"],
        test_key_pair(TestKey::Alice).public_key().to_wire()
    );
    assert!(body.get("peer_public_key").is_none());
}

#[tokio::test]
async fn test_handshake_with_dead_peer_fails_after_retries() {
    let (state, _events) = state(&service_config(TestKey::Alice, "alice", dead_peer())).await;
    let response = http_server::router(state.clone())
        .oneshot(post_json("/api/v0/chat/handshake", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "failed");
    assert_eq!(body["attempts"], 2);
}
