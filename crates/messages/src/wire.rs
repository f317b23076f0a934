//! Poll request/response message types.

use snowfall_types::{BlockId, Vote};

/// A query asking a peer how it currently votes on each listed candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    /// Caller-chosen id echoed back in the response.
    pub request_id: u32,
    /// Ordered batch of candidate ids, at most
    /// [`MAX_POLL_INVENTORY`](crate::MAX_POLL_INVENTORY) entries.
    pub inventory: Vec<BlockId>,
}

impl PollRequest {
    pub fn new(request_id: u32, inventory: Vec<BlockId>) -> Self {
        Self {
            request_id,
            inventory,
        }
    }
}

/// A peer's answer to a [`PollRequest`].
///
/// `votes` carries one byte per inventory entry, in inventory order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResponse {
    /// Echo of the request id this response answers.
    pub request_id: u32,
    /// Raw vote bytes; decode each with [`Vote::from_byte`].
    pub votes: Vec<u8>,
}

impl PollResponse {
    pub fn new(request_id: u32, votes: Vec<u8>) -> Self {
        Self { request_id, votes }
    }

    /// Build a response from decoded votes.
    pub fn from_votes(request_id: u32, votes: impl IntoIterator<Item = Vote>) -> Self {
        Self {
            request_id,
            votes: votes.into_iter().map(|v| v.as_byte()).collect(),
        }
    }

    /// Iterate the votes decoded per the wire rules (reserved bytes are
    /// neutral).
    pub fn votes(&self) -> impl Iterator<Item = Vote> + '_ {
        self.votes.iter().copied().map(Vote::from_byte)
    }
}
