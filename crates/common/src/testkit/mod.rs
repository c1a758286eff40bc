/// Lightweight harness for protocol tests
///
/// Runs two (or more) nodes in-process, connected by [`TestTransport`] instead of HTTP, so
/// handshake and messaging behaviour can be exercised without sockets. The transport can be
/// scripted to fail, and with tokio's paused clock the retry timing is deterministic.
///
/// # Example
///
/// ```rust,ignore
/// use common::protocol::{HandshakeStatus, NodeConfig};
/// use common::testkit::TestNetwork;
///
/// #[tokio::test]
/// async fn test_chat() -> anyhow::Result<()> {
///     let net = TestNetwork::pair(NodeConfig::default())?;
///
///     let outcome = net.alice().node().initiate_handshake().await;
///     assert_eq!(outcome.status, HandshakeStatus::Established);
///
///     net.alice().node().send_message("hello").await?;
///     assert_eq!(net.bob().drain_events().len(), 1);
///     Ok(())
/// }
/// ```
pub mod keys;
mod network;
mod peer;
mod transport;

pub use keys::{test_key_pair, TestKey};
pub use network::TestNetwork;
pub use peer::TestPeer;
pub use transport::TestTransport;
