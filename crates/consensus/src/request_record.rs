//! Outstanding-query bookkeeping.

use snowfall_types::{BlockId, PeerId};
use std::time::Duration;

/// Identifies one outstanding query: the random request id plus the peer it
/// was sent to. Responses from other peers never match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub request_id: u32,
    pub peer: PeerId,
}

impl QueryKey {
    pub fn new(request_id: u32, peer: PeerId) -> Self {
        Self { request_id, peer }
    }
}

/// Record of one dispatched query. Immutable after creation.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    inventory: Vec<BlockId>,
    issued_at: Duration,
    expires_at: Duration,
}

impl RequestRecord {
    /// Create a record for a query issued at `now` that expires after
    /// `timeout`.
    pub fn new(inventory: Vec<BlockId>, now: Duration, timeout: Duration) -> Self {
        Self {
            inventory,
            issued_at: now,
            expires_at: now + timeout,
        }
    }

    /// Candidate ids carried by the query, in wire order.
    pub fn inventory(&self) -> &[BlockId] {
        &self.inventory
    }

    /// Consume the record, keeping its inventory.
    pub fn into_inventory(self) -> Vec<BlockId> {
        self.inventory
    }

    /// When the query was issued.
    pub fn issued_at(&self) -> Duration {
        self.issued_at
    }

    /// Whether the query has outlived its timeout.
    pub fn is_expired(&self, now: Duration) -> bool {
        now > self.expires_at
    }
}
