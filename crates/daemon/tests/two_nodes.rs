//! Two daemons on loopback talking over real HTTP

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use url::Url;

use ::common::prelude::{AuthMode, ChatEvent, HandshakeStatus};
use ::common::protocol::{ChannelSink, Direction};
use ::common::testkit::TestKey;
use parley_daemon::http_server::api::client::{ApiClient, ApiError};
use parley_daemon::http_server::api::v0::chat::{InitiateRequest, SendRequest, SessionRequest};
use parley_daemon::{http_server, ServiceConfig, ServiceState};

struct RunningNode {
    client: ApiClient,
    state: ServiceState,
    events: flume::Receiver<ChatEvent>,
}

fn url_of(addr: SocketAddr) -> Url {
    Url::parse(&format!("http://{}", addr)).unwrap()
}

async fn serve(
    listener: TcpListener,
    config: ServiceConfig,
    shutdown_rx: watch::Receiver<()>,
) -> RunningNode {
    let url = url_of(listener.local_addr().unwrap());
    let (sink, events) = ChannelSink::new();
    let state = ServiceState::from_config(&config, sink).await.unwrap();

    let router = http_server::router(state.clone());
    let mut rx = shutdown_rx;
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = rx.changed().await;
            })
            .await
            .unwrap();
    });

    RunningNode {
        client: ApiClient::new(&url).unwrap(),
        state,
        events,
    }
}

/// Alice and Bob, each pointing at the other.
async fn pair(auth_mode: AuthMode) -> (RunningNode, RunningNode, watch::Sender<()>) {
    common::init_tracing();
    let alice_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let bob_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let alice_url = url_of(alice_listener.local_addr().unwrap());
    let bob_url = url_of(bob_listener.local_addr().unwrap());

    let mut alice_config = common::service_config(TestKey::Alice, "alice", bob_url);
    let mut bob_config = common::service_config(TestKey::Bob, "bob", alice_url);
    alice_config.node.auth_mode = auth_mode;
    bob_config.node.auth_mode = auth_mode;

    let (tx, rx) = watch::channel(());
    let alice = serve(alice_listener, alice_config, rx.clone()).await;
    let bob = serve(bob_listener, bob_config, rx).await;
    (alice, bob, tx)
}

async fn next_event(events: &flume::Receiver<ChatEvent>) -> ChatEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv_async())
        .await
        .expect("no event within 5s")
        .unwrap()
}

#[tokio::test]
async fn test_handshake_then_message() {
    for auth_mode in [AuthMode::Signature, AuthMode::SharedSecret] {
        let (alice, bob, shutdown) = pair(auth_mode).await;

        let outcome = alice.client.call(InitiateRequest::default()).await.unwrap();
        assert_eq!(outcome.status, HandshakeStatus::Established);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(
            bob.state.node().session().status(),
            HandshakeStatus::Established
        );

        let session = bob.client.call(SessionRequest::default()).await.unwrap();
        assert_eq!(
            session.peer_fingerprint.as_deref(),
            Some(alice.state.node().session().public_key().fingerprint().as_str())
        );

        let response = alice
            .client
            .call(SendRequest {
                text: "hello bob".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.status, "ok");

        match next_event(&alice.events).await {
            ChatEvent::Message {
                text, direction, ..
            } => {
                assert_eq!(text, "hello bob");
                assert_eq!(direction, Direction::Sent);
            }
            other => panic!("unexpected event {:?}", other),
        }
        match next_event(&bob.events).await {
            ChatEvent::Message {
                text,
                direction,
                user,
                ..
            } => {
                assert_eq!(text, "hello bob");
                assert_eq!(direction, Direction::Received);
                assert_eq!(user, "alice");
            }
            other => panic!("unexpected event {:?}", other),
        }

        let _ = shutdown.send(());
    }
}

#[tokio::test]
async fn test_send_to_stopped_peer_is_500() {
    let (alice, _bob, shutdown) = pair(AuthMode::Signature).await;
    let outcome = alice.client.call(InitiateRequest::default()).await.unwrap();
    assert_eq!(outcome.status, HandshakeStatus::Established);

    // stop both servers, then bring Alice's API back up on a fresh port
    let _ = shutdown.send(());
    tokio::time::sleep(Duration::from_millis(200)).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = url_of(listener.local_addr().unwrap());
    let (_tx, rx) = watch::channel(());
    let router = http_server::router(alice.state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let mut rx = rx;
                let _ = rx.changed().await;
            })
            .await
            .unwrap();
    });

    let client = ApiClient::new(&url).unwrap();
    let err = client
        .call(SendRequest {
            text: "anyone there?".to_string(),
        })
        .await
        .unwrap_err();
    match err {
        ApiError::HttpStatus(status, _) => assert_eq!(status.as_u16(), 500),
        other => panic!("unexpected error {:?}", other),
    }

    // sent, then the delivery failure
    assert!(matches!(
        next_event(&alice.events).await,
        ChatEvent::Message { .. }
    ));
    assert!(matches!(
        next_event(&alice.events).await,
        ChatEvent::Error { .. }
    ));
}
