//! Multi-node cluster harness.

use crate::{MemoryNetwork, NetworkConfig, StakeWeightedChooser};
use snowfall_consensus::ConsensusConfig;
use snowfall_engine::{ConsensusEngine, EngineHandle};
use snowfall_types::{BlockId, PeerId, Status};
use std::sync::Arc;
use tokio::sync::oneshot;

/// A cluster of engines wired together over a [`MemoryNetwork`].
///
/// Every node's chooser samples uniformly over the other nodes; every
/// node's event channel is registered with the network so inbound queries
/// flow through the real stream handler.
pub struct SimCluster {
    nodes: Vec<(PeerId, EngineHandle)>,
    network: Arc<MemoryNetwork>,
}

impl SimCluster {
    /// Spin up `size` nodes named `node-0` .. `node-{size-1}`.
    ///
    /// Must be called inside a tokio runtime; `seed` fixes all simulation
    /// randomness apart from the engines' request ids.
    pub fn new(
        size: usize,
        config: ConsensusConfig,
        net_config: NetworkConfig,
        seed: u64,
    ) -> Self {
        let network = MemoryNetwork::new(net_config, seed);
        let peers: Vec<PeerId> = (0..size)
            .map(|i| PeerId::new(format!("node-{i}")))
            .collect();

        let mut nodes = Vec::with_capacity(size);
        for (i, peer) in peers.iter().enumerate() {
            let others = peers.iter().filter(|p| *p != peer).cloned();
            let chooser = StakeWeightedChooser::uniform(others, seed ^ (i as u64 + 1));
            let transport = network.transport(peer.clone());
            let handle = ConsensusEngine::new(config.clone(), transport, chooser).start();
            network.register(peer.clone(), handle.event_sender());
            nodes.push((peer.clone(), handle));
        }

        Self { nodes, network }
    }

    /// Peer ids of all nodes, in index order.
    pub fn peers(&self) -> Vec<PeerId> {
        self.nodes.iter().map(|(peer, _)| peer.clone()).collect()
    }

    /// Handle of the node at `index`.
    pub fn handle(&self, index: usize) -> &EngineHandle {
        &self.nodes[index].1
    }

    /// The underlying network, for injecting faults.
    pub fn network(&self) -> &Arc<MemoryNetwork> {
        &self.network
    }

    /// Submit a candidate on one node, returning its verdict channel.
    pub async fn submit(
        &self,
        index: usize,
        id: BlockId,
        preference: bool,
    ) -> oneshot::Receiver<Status> {
        let (tx, rx) = oneshot::channel();
        self.nodes[index]
            .1
            .new_block(id, preference, tx)
            .await
            .expect("engine stopped");
        rx
    }

    /// Submit a candidate on every node with the same preference.
    pub async fn submit_everywhere(
        &self,
        id: BlockId,
        preference: bool,
    ) -> Vec<oneshot::Receiver<Status>> {
        let mut receivers = Vec::with_capacity(self.nodes.len());
        for index in 0..self.nodes.len() {
            receivers.push(self.submit(index, id, preference).await);
        }
        receivers
    }

    /// Stop every node, draining their event loops.
    pub async fn stop(self) {
        for (_, handle) in self.nodes {
            handle.stop().await;
        }
    }
}
