//! Shared test utilities for protocol integration tests
#![allow(dead_code)]

use std::time::Duration;

use ::common::crypto::CryptoMode;
use ::common::protocol::{AuthMode, HandshakeStatus, MessagePayload, NodeConfig, RetryPolicy};
use ::common::testkit::TestNetwork;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config(crypto_mode: CryptoMode, auth_mode: AuthMode) -> NodeConfig {
    NodeConfig {
        crypto_mode,
        auth_mode,
        retry: RetryPolicy::new(5, Duration::from_secs(1)),
        ..NodeConfig::default()
    }
}

/// Alice and Bob after a successful handshake initiated by Alice
pub async fn established_pair(config: NodeConfig) -> TestNetwork {
    init_tracing();
    let net = TestNetwork::pair(config).unwrap();
    let outcome = net.alice().node().initiate_handshake().await;
    assert_eq!(outcome.status, HandshakeStatus::Established);
    assert_eq!(net.bob().node().session().status(), HandshakeStatus::Established);
    net
}

/// Flip one bit of the decoded ciphertext and re-encode it.
pub fn flip_ciphertext_byte(payload: &mut MessagePayload, index: usize) {
    let mut bytes = payload.ciphertext_bytes().unwrap();
    bytes[index] ^= 0x01;
    payload.ciphertext = Some(BASE64.encode(bytes));
}
