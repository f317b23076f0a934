//! Simulated network with configurable latency, packet loss, and partitions.

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use snowfall_engine::{handle_stream, Event, PeerTransport, TransportError};
use snowfall_messages::codec::{read_response, write_request, MAX_REQUEST_FRAME};
use snowfall_messages::{PollRequest, PollResponse};
use snowfall_types::PeerId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::trace;

/// Configuration for the simulated network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Base one-way delivery latency.
    pub latency: Duration,
    /// Jitter as a fraction of base latency (0.0 - 1.0).
    pub jitter_fraction: f64,
    /// Probability that a request is dropped outright (0.0 - 1.0).
    pub packet_loss_rate: f64,
    /// How long a request waits before a drop or dead peer surfaces as a
    /// timeout. Keep this below the engine's request timeout.
    pub request_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(2),
            jitter_fraction: 0.1,
            packet_loss_rate: 0.0,
            request_timeout: Duration::from_millis(200),
        }
    }
}

/// In-process network routing poll queries between registered engines.
///
/// Every request travels through the real wire path: framed onto a duplex
/// stream, decoded by the target engine's stream handler, and the framed
/// response read back. Faults are injected before the stream is opened.
///
/// Partitions are directional: `(a, b)` in the set drops requests from `a`
/// to `b`.
pub struct MemoryNetwork {
    config: NetworkConfig,
    rng: Mutex<ChaCha8Rng>,
    peers: Mutex<HashMap<PeerId, mpsc::Sender<Event>>>,
    partitions: Mutex<HashSet<(PeerId, PeerId)>>,
}

impl MemoryNetwork {
    /// Create a network; `seed` fixes the fault/jitter randomness.
    pub fn new(config: NetworkConfig, seed: u64) -> Arc<Self> {
        Arc::new(Self {
            config,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            peers: Mutex::new(HashMap::new()),
            partitions: Mutex::new(HashSet::new()),
        })
    }

    /// Register an engine's event sender under a peer id, making it
    /// reachable.
    pub fn register(&self, peer: PeerId, event_tx: mpsc::Sender<Event>) {
        self.peers.lock().unwrap().insert(peer, event_tx);
    }

    /// Build the transport a node uses to send queries.
    pub fn transport(self: &Arc<Self>, local: PeerId) -> Arc<MemoryTransport> {
        Arc::new(MemoryTransport {
            local,
            network: Arc::clone(self),
        })
    }

    // === Partition management ===

    /// Drop requests from `from` to `to`.
    pub fn partition_unidirectional(&self, from: PeerId, to: PeerId) {
        self.partitions.lock().unwrap().insert((from, to));
    }

    /// Drop requests between `a` and `b` in both directions.
    pub fn partition_bidirectional(&self, a: PeerId, b: PeerId) {
        let mut partitions = self.partitions.lock().unwrap();
        partitions.insert((a.clone(), b.clone()));
        partitions.insert((b, a));
    }

    /// Cut a node off from every registered peer, both directions.
    pub fn isolate(&self, node: &PeerId) {
        let peers: Vec<PeerId> = self.peers.lock().unwrap().keys().cloned().collect();
        let mut partitions = self.partitions.lock().unwrap();
        for other in peers {
            if &other != node {
                partitions.insert((node.clone(), other.clone()));
                partitions.insert((other, node.clone()));
            }
        }
    }

    /// Remove all partitions.
    pub fn heal(&self) {
        self.partitions.lock().unwrap().clear();
    }

    fn is_partitioned(&self, from: &PeerId, to: &PeerId) -> bool {
        self.partitions
            .lock()
            .unwrap()
            .contains(&(from.clone(), to.clone()))
    }

    fn peer_sender(&self, peer: &PeerId) -> Option<mpsc::Sender<Event>> {
        self.peers.lock().unwrap().get(peer).cloned()
    }

    fn drops_packet(&self) -> bool {
        if self.config.packet_loss_rate <= 0.0 {
            return false;
        }
        self.rng
            .lock()
            .unwrap()
            .gen_bool(self.config.packet_loss_rate)
    }

    fn sample_latency(&self) -> Duration {
        if self.config.jitter_fraction <= 0.0 {
            return self.config.latency;
        }
        let jitter = self.rng.lock().unwrap().gen_range(0.0..self.config.jitter_fraction);
        self.config.latency.mul_f64(1.0 + jitter)
    }
}

/// One node's view of the [`MemoryNetwork`].
pub struct MemoryTransport {
    local: PeerId,
    network: Arc<MemoryNetwork>,
}

#[async_trait]
impl PeerTransport for MemoryTransport {
    async fn send_request(
        &self,
        peer: &PeerId,
        request: PollRequest,
    ) -> Result<PollResponse, TransportError> {
        let Some(target) = self.network.peer_sender(peer) else {
            return Err(TransportError::Unreachable(peer.to_string()));
        };

        if self.network.is_partitioned(&self.local, peer) || self.network.drops_packet() {
            trace!(from = %self.local, to = %peer, "dropping request");
            tokio::time::sleep(self.network.config.request_timeout).await;
            return Err(TransportError::Timeout);
        }

        tokio::time::sleep(self.network.sample_latency()).await;

        // Route over a real framed stream so the codec and the target's
        // stream handler are exercised end to end.
        let (mut client, server) = tokio::io::duplex(MAX_REQUEST_FRAME + 16);
        tokio::spawn(async move {
            let _ = handle_stream(server, target).await;
        });

        let request_id = request.request_id;
        write_request(&mut client, &request).await?;
        let response = tokio::time::timeout(
            self.network.config.request_timeout,
            read_response(&mut client),
        )
        .await
        .map_err(|_| TransportError::Timeout)??;

        if response.request_id != request_id {
            return Err(TransportError::Stream("response id mismatch".into()));
        }
        Ok(response)
    }
}
