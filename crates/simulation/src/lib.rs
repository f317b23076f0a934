//! In-memory network and cluster harness for the snowfall engine.
//!
//! Provides everything needed to run a multi-node consensus cluster inside a
//! single process:
//!
//! - [`MemoryNetwork`]: routes poll queries between registered engines over
//!   real framed streams, with configurable latency, jitter, packet loss,
//!   and partitions. Deterministic given a seed.
//! - [`StakeWeightedChooser`]: a
//!   [`WeightedChooser`](snowfall_engine::WeightedChooser) over a static
//!   [`ValidatorSet`](snowfall_types::ValidatorSet).
//! - [`SimCluster`]: wires N engines together for integration tests.

mod cluster;
mod network;
mod validators;

pub use cluster::SimCluster;
pub use network::{MemoryNetwork, MemoryTransport, NetworkConfig};
pub use validators::StakeWeightedChooser;
