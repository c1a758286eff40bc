//! Integration tests for the handshake state machine over the in-memory transport

mod common;

use std::time::Duration;

use ::common::crypto::CryptoMode;
use ::common::protocol::{
    AuthMode, HandshakePayload, HandshakeStatus, ProtocolError, TransportError,
};
use ::common::testkit::TestNetwork;

#[tokio::test]
async fn test_handshake_exchanges_public_keys() {
    let net = common::established_pair(common::config(
        CryptoMode::Padded,
        AuthMode::Signature,
    ))
    .await;
    let alice = net.alice().node();
    let bob = net.bob().node();

    assert_eq!(
        alice.session().peer_public_key().unwrap(),
        bob.session().public_key()
    );
    assert_eq!(
        bob.session().peer_public_key().unwrap(),
        alice.session().public_key()
    );
    assert!(!alice.session().has_shared_secret());
}

#[tokio::test]
async fn test_second_initiate_is_a_noop() {
    let net = common::established_pair(common::config(
        CryptoMode::Padded,
        AuthMode::Signature,
    ))
    .await;

    let outcome = net.alice().node().initiate_handshake().await;
    assert_eq!(outcome.status, HandshakeStatus::Established);
    assert_eq!(outcome.attempts, 0);
    assert_eq!(net.alice().transport().handshake_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_peer_fails_after_five_spaced_attempts() {
    common::init_tracing();
    let net = TestNetwork::pair(common::config(CryptoMode::Padded, AuthMode::Signature)).unwrap();
    net.alice()
        .transport()
        .fail_always(TransportError::Network("connection refused".into()));

    let outcome = net.alice().node().initiate_handshake().await;
    assert_eq!(outcome.status, HandshakeStatus::Failed);
    assert_eq!(outcome.attempts, 5);

    let calls = net.alice().transport().handshake_calls();
    assert_eq!(calls.len(), 5);
    for pair in calls.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_secs(1));
    }
    assert_eq!(net.bob().node().session().status(), HandshakeStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_succeeds_on_third_attempt() {
    common::init_tracing();
    let net = TestNetwork::pair(common::config(CryptoMode::Padded, AuthMode::Signature)).unwrap();
    net.alice().transport().fail_next(2, TransportError::Timeout);

    let start = tokio::time::Instant::now();
    let outcome = net.alice().node().initiate_handshake().await;
    assert_eq!(outcome.status, HandshakeStatus::Established);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(start.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_failed_handshake_can_be_retried() {
    let net = TestNetwork::pair(common::config(CryptoMode::Padded, AuthMode::Signature)).unwrap();
    net.alice().transport().fail_always(TransportError::Timeout);
    assert_eq!(
        net.alice().node().initiate_handshake().await.status,
        HandshakeStatus::Failed
    );

    net.alice().transport().heal();
    let outcome = net.alice().node().initiate_handshake().await;
    assert_eq!(outcome.status, HandshakeStatus::Established);
    assert_eq!(outcome.attempts, 1);
}

#[tokio::test]
async fn test_shared_secret_mode_agrees_on_secret() {
    let net = common::established_pair(common::config(
        CryptoMode::Padded,
        AuthMode::SharedSecret,
    ))
    .await;
    assert!(net.alice().node().session().has_shared_secret());
    assert!(net.bob().node().session().has_shared_secret());
}

#[tokio::test(start_paused = true)]
async fn test_simultaneous_initiators_agree_on_one_secret() {
    common::init_tracing();
    let net = TestNetwork::pair(common::config(CryptoMode::Padded, AuthMode::SharedSecret))
        .unwrap();
    // both requests are in flight before either side hears back
    net.alice().transport().set_latency(Duration::from_millis(20));
    net.bob().transport().set_latency(Duration::from_millis(20));
    let alice = net.alice().node();
    let bob = net.bob().node();

    let (alice_outcome, bob_outcome) =
        tokio::join!(alice.initiate_handshake(), bob.initiate_handshake());
    assert_eq!(alice_outcome.status, HandshakeStatus::Established);
    assert_eq!(bob_outcome.status, HandshakeStatus::Established);

    let alice_secret = alice.session().established().unwrap().shared_secret;
    let bob_secret = bob.session().established().unwrap().shared_secret;
    assert!(alice_secret.is_some());
    assert_eq!(alice_secret, bob_secret);

    alice.send_message("hello bob").await.unwrap();
    bob.send_message("hello alice").await.unwrap();
}

#[tokio::test]
async fn test_responder_rejects_missing_or_bad_key() {
    let net = TestNetwork::pair(common::config(CryptoMode::Padded, AuthMode::Signature)).unwrap();
    let bob = net.bob().node();

    let err = bob.handle_handshake(HandshakePayload::default()).unwrap_err();
    assert!(matches!(err, ProtocolError::Validation(_)));

    let err = bob
        .handle_handshake(HandshakePayload {
            public_key: Some("not a key".into()),
            shared_key: None,
        })
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Validation(_)));
    assert_eq!(bob.session().status(), HandshakeStatus::Idle);
}

#[tokio::test]
async fn test_responder_requires_shared_key_in_mac_mode() {
    let net = TestNetwork::pair(common::config(CryptoMode::Padded, AuthMode::SharedSecret))
        .unwrap();
    let alice_key = net.alice().node().session().public_key().to_wire();
    let bob = net.bob().node();

    let err = bob
        .handle_handshake(HandshakePayload {
            public_key: Some(alice_key.clone()),
            shared_key: None,
        })
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Validation(_)));

    let err = bob
        .handle_handshake(HandshakePayload {
            public_key: Some(alice_key),
            shared_key: Some("dG9vIHNob3J0".into()),
        })
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Validation(_)));
}

#[tokio::test]
async fn test_responder_is_idempotent_and_accepts_pem() {
    let net = TestNetwork::pair(common::config(CryptoMode::Padded, AuthMode::Signature)).unwrap();
    let alice = net.alice().node().session().public_key();
    let bob = net.bob().node();

    let request = HandshakePayload {
        public_key: Some(alice.to_pem()),
        shared_key: None,
    };
    let first = bob.handle_handshake(request.clone()).unwrap();
    let second = bob.handle_handshake(request).unwrap();
    assert_eq!(first, second);
    assert_eq!(bob.session().peer_public_key().unwrap(), alice);
    assert_eq!(bob.session().status(), HandshakeStatus::Established);
}
