use std::collections::HashMap;

use anyhow::{anyhow, Result};

use crate::crypto::KeyPair;
use crate::protocol::NodeConfig;

use super::keys::{test_key_pair, TestKey};
use super::peer::TestPeer;

/// A set of in-memory peers and the links between them
///
/// Links hold clones of the peers' nodes, so they are cut when the network is dropped.
#[derive(Default)]
pub struct TestNetwork {
    /// All peers in the network, indexed by name
    peers: HashMap<String, TestPeer>,
}

impl TestNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alice and Bob, linked to each other, both using `config`.
    pub fn pair(config: NodeConfig) -> Result<Self> {
        let mut net = Self::new();
        net.add_peer("alice", test_key_pair(TestKey::Alice).clone(), config.clone())?;
        net.add_peer("bob", test_key_pair(TestKey::Bob).clone(), config)?;
        net.link("alice", "bob")?;
        Ok(net)
    }

    /// Add a peer. It cannot reach anyone until [`TestNetwork::link`] is called.
    pub fn add_peer(
        &mut self,
        name: impl Into<String>,
        key_pair: KeyPair,
        config: NodeConfig,
    ) -> Result<&TestPeer> {
        let name = name.into();
        if self.peers.contains_key(&name) {
            return Err(anyhow!("Peer '{}' already exists", name));
        }
        let peer = TestPeer::new(name.clone(), key_pair, config);
        Ok(self.peers.entry(name).or_insert(peer))
    }

    /// Make `a` and `b` each other's peer.
    pub fn link(&self, a: &str, b: &str) -> Result<()> {
        let peer_a = self.get(a)?;
        let peer_b = self.get(b)?;
        peer_a.transport().connect(peer_b.node().clone());
        peer_b.transport().connect(peer_a.node().clone());
        tracing::debug!("linked {} <-> {}", a, b);
        Ok(())
    }

    /// Get a peer by name
    pub fn peer(&self, name: &str) -> Option<&TestPeer> {
        self.peers.get(name)
    }

    fn get(&self, name: &str) -> Result<&TestPeer> {
        self.peers
            .get(name)
            .ok_or_else(|| anyhow!("Peer '{}' not found", name))
    }

    pub fn alice(&self) -> &TestPeer {
        self.peer("alice").expect("network has no alice")
    }

    pub fn bob(&self) -> &TestPeer {
        self.peer("bob").expect("network has no bob")
    }
}

impl Drop for TestNetwork {
    fn drop(&mut self) {
        for peer in self.peers.values() {
            peer.transport().disconnect();
        }
    }
}
