//! Candidate lifecycle status.

use std::fmt;

/// The lifecycle status of a candidate block.
///
/// A candidate starts `Active` and reaches exactly one of the two terminal
/// states once its confidence hits the finalization score. Terminal verdicts
/// are what the engine delivers through submission callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Still being voted on.
    Active,
    /// Accepted into the ledger.
    Finalized,
    /// Definitively rejected.
    Rejected,
}

impl Status {
    /// Whether this status is terminal (no further votes change the record).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Active)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Active => f.write_str("active"),
            Status::Finalized => f.write_str("finalized"),
            Status::Rejected => f.write_str("rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!Status::Active.is_terminal());
        assert!(Status::Finalized.is_terminal());
        assert!(Status::Rejected.is_terminal());
    }
}
