use std::sync::Arc;

use crate::crypto::KeyPair;
use crate::protocol::{ChannelSink, ChatEvent, Node, NodeConfig};

use super::transport::TestTransport;

/// A node wired to an in-memory transport, with its events captured
pub struct TestPeer {
    /// The name of this peer (for debugging)
    pub name: String,
    node: Node,
    transport: Arc<TestTransport>,
    events: flume::Receiver<ChatEvent>,
}

impl TestPeer {
    /// Create a peer that is not connected to anyone yet.
    ///
    /// # Arguments
    /// * `name` - Used as the node's user name
    /// * `key_pair` - The node's identity
    /// * `config` - Modes and retry policy; `user` is overwritten with `name`
    pub fn new(name: impl Into<String>, key_pair: KeyPair, mut config: NodeConfig) -> Self {
        let name = name.into();
        config.user = name.clone();

        let transport = Arc::new(TestTransport::new());
        let (sink, events) = ChannelSink::new();
        let node = Node::new(
            Arc::new(key_pair),
            config,
            transport.clone(),
            Arc::new(sink),
        );

        Self {
            name,
            node,
            transport,
            events,
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn transport(&self) -> &TestTransport {
        &self.transport
    }

    /// Events emitted since the last call.
    pub fn drain_events(&self) -> Vec<ChatEvent> {
        self.events.try_iter().collect()
    }
}
