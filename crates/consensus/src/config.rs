//! Engine tunables.

use std::time::Duration;

/// How long to wait for a response to an outstanding query.
pub const AVALANCHE_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Consecutive confirming polls required to finalize a candidate.
pub const AVALANCHE_FINALIZATION_SCORE: u16 = 128;

/// Interval between poll scheduler ticks.
pub const AVALANCHE_TIME_STEP: Duration = Duration::from_millis(1);

/// Maximum outstanding queries covering any single candidate.
pub const AVALANCHE_MAX_INFLIGHT_POLL: u8 = 10;

/// Maximum candidate ids in a single outbound query.
pub const AVALANCHE_MAX_ELEMENT_POLL: usize = 4096;

/// How long an unfinalized candidate is kept before garbage collection.
pub const DELETE_INVENTORY_AFTER: Duration = Duration::from_secs(6 * 60 * 60);

/// Configuration for the consensus engine.
///
/// Defaults mirror the protocol constants above; simulation shrinks the
/// timing knobs via [`ConsensusConfig::for_tests`].
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Per-query transport timeout.
    pub request_timeout: Duration,
    /// Confidence score at which a record becomes terminal.
    pub finalization_score: u16,
    /// Poll scheduler tick interval.
    pub poll_interval: Duration,
    /// Per-candidate in-flight query cap.
    pub max_inflight_poll: u8,
    /// Per-query inventory cap.
    pub max_element_poll: usize,
    /// GC horizon for candidates that never finalize.
    pub delete_inventory_after: Duration,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            request_timeout: AVALANCHE_REQUEST_TIMEOUT,
            finalization_score: AVALANCHE_FINALIZATION_SCORE,
            poll_interval: AVALANCHE_TIME_STEP,
            max_inflight_poll: AVALANCHE_MAX_INFLIGHT_POLL,
            max_element_poll: AVALANCHE_MAX_ELEMENT_POLL,
            delete_inventory_after: DELETE_INVENTORY_AFTER,
        }
    }
}

impl ConsensusConfig {
    /// Config with a short query timeout for tests. The GC horizon stays at
    /// its default so records survive a slow test run; GC behavior is tested
    /// with injected time instead.
    pub fn for_tests() -> Self {
        Self {
            request_timeout: Duration::from_millis(250),
            ..Default::default()
        }
    }

    /// Set the per-query transport timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the finalization score.
    pub fn with_finalization_score(mut self, score: u16) -> Self {
        self.finalization_score = score;
        self
    }

    /// Set the poll tick interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the GC horizon for unfinalized candidates.
    pub fn with_delete_inventory_after(mut self, horizon: Duration) -> Self {
        self.delete_inventory_after = horizon;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol_constants() {
        let config = ConsensusConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.finalization_score, 128);
        assert_eq!(config.poll_interval, Duration::from_millis(1));
        assert_eq!(config.max_inflight_poll, 10);
        assert_eq!(config.max_element_poll, 4096);
        assert_eq!(config.delete_inventory_after, Duration::from_secs(21_600));
    }
}
