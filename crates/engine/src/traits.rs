//! Interfaces the engine consumes.

use crate::TransportError;
use async_trait::async_trait;
use snowfall_messages::{PollRequest, PollResponse};
use snowfall_types::PeerId;

/// Delivers a poll query to a peer and awaits its single response.
///
/// Implementations own their timeout, which must not exceed the configured
/// request timeout (60 s by default); on timeout or any transport failure
/// they return an error and the engine lets the query expire. The engine
/// invokes this from many detached workers concurrently, so implementations
/// must be concurrent-safe.
#[async_trait]
pub trait PeerTransport: Send + Sync + 'static {
    async fn send_request(
        &self,
        peer: &PeerId,
        request: PollRequest,
    ) -> Result<PollResponse, TransportError>;
}

/// Samples a validator peer with probability proportional to stake.
///
/// Called once per scheduler tick. Returning `None` (no validators known)
/// makes the tick yield nothing; it is not an error.
pub trait WeightedChooser: Send + Sync + 'static {
    fn weighted_random_validator(&self) -> Option<PeerId>;
}
