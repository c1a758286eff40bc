use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use crate::protocol::{
    HandshakePayload, MessagePayload, Node, PeerTransport, ProtocolError, TransportError,
};

type Tamper = Box<dyn Fn(&mut MessagePayload) + Send + Sync>;

/// Scripted failures for upcoming requests
#[derive(Debug, Clone)]
enum Failure {
    Next { remaining: u32, error: TransportError },
    Always(TransportError),
}

/// In-memory transport that calls straight into another [`Node`].
///
/// Can be told to fail the next few requests (or all of them), and can rewrite outgoing
/// messages to simulate an attacker on the wire. Every handshake request is timestamped with
/// tokio's clock so tests running with a paused clock can check the spacing of retries.
#[derive(Default)]
pub struct TestTransport {
    peer: RwLock<Option<Node>>,
    failure: Mutex<Option<Failure>>,
    tamper: Mutex<Option<Tamper>>,
    handshake_calls: Mutex<Vec<Instant>>,
    deliveries: AtomicUsize,
    latency: Mutex<Option<Duration>>,
}

impl TestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route requests to `node`.
    pub fn connect(&self, node: Node) {
        *self.peer.write() = Some(node);
    }

    pub fn disconnect(&self) {
        self.peer.write().take();
    }

    /// Fail the next `count` requests with `error`, then behave normally.
    pub fn fail_next(&self, count: u32, error: TransportError) {
        *self.failure.lock() = Some(Failure::Next {
            remaining: count,
            error,
        });
    }

    /// Fail every request with `error` until [`TestTransport::heal`] is called.
    pub fn fail_always(&self, error: TransportError) {
        *self.failure.lock() = Some(Failure::Always(error));
    }

    pub fn heal(&self) {
        self.failure.lock().take();
    }

    /// Delay each handshake by `latency` on the way out and again on the way back.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Rewrite every outgoing message before it reaches the peer.
    pub fn tamper_with(&self, f: impl Fn(&mut MessagePayload) + Send + Sync + 'static) {
        *self.tamper.lock() = Some(Box::new(f));
    }

    /// When each handshake request was made.
    pub fn handshake_calls(&self) -> Vec<Instant> {
        self.handshake_calls.lock().clone()
    }

    /// Messages that reached the peer (whether or not it accepted them).
    pub fn deliveries(&self) -> usize {
        self.deliveries.load(Ordering::SeqCst)
    }

    fn scripted_failure(&self) -> Option<TransportError> {
        let mut failure = self.failure.lock();
        let (error, spent) = match failure.as_mut()? {
            Failure::Always(error) => (Some(error.clone()), false),
            Failure::Next { remaining: 0, .. } => (None, true),
            Failure::Next { remaining, error } => {
                *remaining -= 1;
                (Some(error.clone()), *remaining == 0)
            }
        };
        if spent {
            failure.take();
        }
        error
    }

    fn peer(&self) -> Result<Node, TransportError> {
        self.peer
            .read()
            .clone()
            .ok_or_else(|| TransportError::Network("no peer connected".to_string()))
    }
}

fn rejected(err: ProtocolError) -> TransportError {
    TransportError::Rejected {
        status: 400,
        body: err.to_string(),
    }
}

#[async_trait]
impl PeerTransport for TestTransport {
    async fn handshake(
        &self,
        payload: HandshakePayload,
    ) -> Result<HandshakePayload, TransportError> {
        self.handshake_calls.lock().push(Instant::now());
        if let Some(error) = self.scripted_failure() {
            return Err(error);
        }
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let reply = self.peer()?.handle_handshake(payload).map_err(rejected);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        reply
    }

    async fn deliver(&self, mut payload: MessagePayload) -> Result<(), TransportError> {
        if let Some(error) = self.scripted_failure() {
            return Err(error);
        }
        let peer = self.peer()?;
        if let Some(tamper) = self.tamper.lock().as_ref() {
            tamper(&mut payload);
        }
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        peer.receive_payload(&payload).map(|_| ()).map_err(rejected)
    }
}
