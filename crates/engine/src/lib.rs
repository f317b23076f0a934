//! Avalanche-style consensus engine.
//!
//! Given a stream of candidate block ids and a population of stake-weighted
//! validator peers, the engine drives each candidate to a terminal verdict
//! (`Finalized` or `Rejected`) by repeatedly polling random validators and
//! feeding the answers through a confidence-accumulating vote record.
//!
//! # Architecture
//!
//! A single event-loop task owns all mutable state:
//!
//! ```text
//! Events → EngineState::handle() → Actions
//! ```
//!
//! [`EngineState`] is the sole mutator of the vote-record, rejection, query,
//! and callback tables. Everything else talks to it through the event
//! channel: the 1 ms poll ticker, detached query workers (one per in-flight
//! poll), and one stream-handler task per inbound peer connection. The
//! runner executes the returned actions (spawning transport workers and
//! completing one-shot reply/verdict channels), so state-mutating code never
//! suspends mid-update.
//!
//! The transport and the validator sampler are injected via the
//! [`PeerTransport`] and [`WeightedChooser`] traits; the engine never opens
//! connections itself.

mod engine;
mod error;
mod event;
pub mod metrics;
mod state;
mod stream;
mod traits;

pub use engine::{ConsensusEngine, EngineHandle};
pub use error::{EngineError, TransportError};
pub use event::{Action, Event};
pub use state::EngineState;
pub use stream::handle_stream;
pub use traits::{PeerTransport, WeightedChooser};
