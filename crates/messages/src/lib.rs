//! Wire protocol for the consensus engine.
//!
//! Two message kinds travel over a bidirectional stream, each framed by an
//! unsigned varint length prefix:
//!
//! - [`PollRequest`]: a request id plus a batch of candidate ids.
//! - [`PollResponse`]: the same request id plus one vote byte per candidate.
//!
//! Direction disambiguates the kinds: the side that opened the stream writes
//! requests and reads responses. Encoding and framing live in [`codec`].

pub mod codec;

mod wire;

pub use codec::{
    read_request, read_response, write_request, write_response, CodecError, MAX_POLL_INVENTORY,
    MAX_REQUEST_FRAME, MAX_RESPONSE_FRAME,
};
pub use wire::{PollRequest, PollResponse};

/// Protocol name suffix; the full protocol identifier is a network-specific
/// prefix joined with this.
pub const CONSENSUS_PROTOCOL: &str = "consensus";

/// Build the full protocol identifier for a network.
///
/// Peers that do not speak a matching protocol are not contacted.
pub fn protocol_id(network_prefix: &str) -> String {
    format!("{network_prefix}{CONSENSUS_PROTOCOL}")
}
