//! Per-candidate vote record.

use snowfall_types::{BlockId, Status, Vote};
use std::time::Duration;

/// One candidate's voting state.
///
/// The record keeps two parallel 8-bit sliding windows over the most recent
/// polls: `votes` holds the outcomes (bit set = yes) and `consider` marks
/// which of those polls were non-neutral and therefore count. Majorities are
/// computed only over considered votes, so neutral polls neither confirm nor
/// contradict the current preference.
///
/// # State Machine
///
/// 1. Every registered vote shifts both windows and recomputes the window
///    majority.
/// 2. A majority agreeing with the current preference increments
///    `confidence`; a contradicting or inconclusive majority resets it.
/// 3. When `confidence` reaches the finalization score the record becomes
///    terminal: `Finalized` if preferred, `Rejected` otherwise. Terminal
///    records never change again (only the in-flight counter moves).
#[derive(Debug, Clone)]
pub struct VoteRecord {
    /// Candidate this record tracks.
    id: BlockId,
    /// Whether this node currently prefers accepting the candidate.
    preference: bool,
    /// Consecutive polls whose majority agreed with `preference`.
    confidence: u16,
    /// Sliding window of poll outcomes, newest in the low bit.
    votes: u8,
    /// Sliding window marking which polls were non-neutral.
    consider: u8,
    /// Outstanding queries that include this candidate.
    inflight: u8,
    /// Lifecycle status.
    status: Status,
    /// Engine-relative creation time, used only for garbage collection.
    created_at: Duration,
}

impl VoteRecord {
    /// Create a record for a freshly submitted candidate.
    pub fn new(id: BlockId, preference: bool, now: Duration) -> Self {
        Self {
            id,
            preference,
            confidence: 0,
            votes: 0,
            consider: 0,
            inflight: 0,
            status: Status::Active,
            created_at: now,
        }
    }

    /// Candidate id.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Current acceptance preference, independent of status.
    pub fn is_preferred(&self) -> bool {
        self.preference
    }

    /// Current confidence score.
    pub fn confidence(&self) -> u16 {
        self.confidence
    }

    /// Lifecycle status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether the record has reached a terminal verdict.
    pub fn is_finalized(&self) -> bool {
        self.status != Status::Active
    }

    /// Outstanding queries covering this candidate.
    pub fn inflight(&self) -> u8 {
        self.inflight
    }

    /// Engine-relative creation time.
    pub fn created_at(&self) -> Duration {
        self.created_at
    }

    /// Note that a query covering this candidate was dispatched.
    ///
    /// The scheduler enforces the in-flight cap before calling this.
    pub fn begin_request(&mut self) {
        self.inflight += 1;
    }

    /// Note that a query covering this candidate completed or expired.
    pub fn end_request(&mut self) {
        self.inflight = self.inflight.saturating_sub(1);
    }

    /// Register one vote for this candidate.
    ///
    /// Returns whether the observable state changed; callers use this for
    /// logging only and must detect terminal transitions via
    /// [`is_finalized`](Self::is_finalized).
    pub fn register_vote(&mut self, vote: Vote, finalization_score: u16) -> bool {
        if self.is_finalized() {
            return false;
        }

        self.votes = (self.votes << 1) | u8::from(vote == Vote::Yes);
        self.consider = (self.consider << 1) | u8::from(vote != Vote::Neutral);

        let yes = (self.votes & self.consider).count_ones() as u16;
        let considered = self.consider.count_ones() as u16;
        let majority_yes = yes * 2 > considered;
        let majority_no = (considered - yes) * 2 > considered;

        let agrees = if self.preference {
            majority_yes
        } else {
            majority_no
        };

        let changed = if agrees {
            if self.confidence < finalization_score {
                self.confidence += 1;
            }
            true
        } else if self.confidence == 0 {
            // Flip only on a clear opposing majority; an inconclusive
            // window leaves the record as it was.
            if self.preference && majority_no {
                self.preference = false;
                self.confidence = 1;
                true
            } else if !self.preference && majority_yes {
                self.preference = true;
                self.confidence = 1;
                true
            } else {
                false
            }
        } else {
            self.confidence = 0;
            true
        };

        if self.confidence >= finalization_score {
            self.status = if self.preference {
                Status::Finalized
            } else {
                Status::Rejected
            };
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCORE: u16 = 128;

    fn record(preference: bool) -> VoteRecord {
        VoteRecord::new(BlockId::new([0x11; 32]), preference, Duration::ZERO)
    }

    #[test]
    fn test_unanimous_yes_finalizes_at_score() {
        let mut vr = record(true);
        for i in 1..=SCORE {
            assert!(!vr.is_finalized(), "finalized early at vote {i}");
            vr.register_vote(Vote::Yes, SCORE);
            assert_eq!(vr.confidence(), i);
        }
        assert_eq!(vr.status(), Status::Finalized);
        assert!(vr.is_preferred());
    }

    #[test]
    fn test_unanimous_no_flips_then_rejects() {
        let mut vr = record(true);

        // First contradicting vote lands while confidence is zero: the
        // preference flips and confidence restarts at one.
        vr.register_vote(Vote::No, SCORE);
        assert!(!vr.is_preferred());
        assert_eq!(vr.confidence(), 1);

        for _ in 1..SCORE {
            vr.register_vote(Vote::No, SCORE);
        }
        assert_eq!(vr.status(), Status::Rejected);
        assert!(!vr.is_preferred());
    }

    #[test]
    fn test_neutral_votes_do_not_count() {
        let mut vr = record(true);
        for _ in 0..1000 {
            let changed = vr.register_vote(Vote::Neutral, SCORE);
            assert!(!changed);
        }
        assert_eq!(vr.status(), Status::Active);
        assert_eq!(vr.confidence(), 0);
    }

    #[test]
    fn test_neutral_does_not_break_an_established_majority() {
        let mut vr = record(true);
        vr.register_vote(Vote::Yes, SCORE);

        // The considered window still shows a yes majority, so neutral
        // polls keep confirming it.
        for _ in 0..5 {
            vr.register_vote(Vote::Neutral, SCORE);
        }
        assert_eq!(vr.confidence(), 6);
        assert!(vr.is_preferred());
    }

    #[test]
    fn test_lone_no_does_not_break_a_yes_window() {
        let mut vr = record(true);
        for _ in 0..100 {
            vr.register_vote(Vote::Yes, SCORE);
        }
        assert_eq!(vr.confidence(), 100);

        // Seven of the eight windowed votes still say yes.
        vr.register_vote(Vote::No, SCORE);
        assert_eq!(vr.confidence(), 101);
        assert!(vr.is_preferred());
    }

    #[test]
    fn test_noisy_stream_still_finalizes() {
        let mut vr = record(true);
        let mut votes_fed = 0u32;
        let stream = std::iter::repeat(Vote::Yes)
            .take(100)
            .chain(std::iter::once(Vote::No))
            .chain(std::iter::repeat(Vote::Yes).take(130));

        for vote in stream {
            votes_fed += 1;
            vr.register_vote(vote, SCORE);
            if vr.is_finalized() {
                break;
            }
        }
        assert_eq!(vr.status(), Status::Finalized);
        assert!(votes_fed <= 230, "took {votes_fed} votes");
    }

    #[test]
    fn test_window_shift_erodes_majority_and_resets_confidence() {
        let mut vr = record(true);
        for _ in 0..8 {
            vr.register_vote(Vote::Yes, SCORE);
        }
        assert_eq!(vr.confidence(), 8);

        // Three no votes leave a 5/8 yes window: still a majority.
        for _ in 0..3 {
            vr.register_vote(Vote::No, SCORE);
        }
        assert_eq!(vr.confidence(), 11);

        // The fourth no ties the window; confidence resets without a flip.
        vr.register_vote(Vote::No, SCORE);
        assert_eq!(vr.confidence(), 0);
        assert!(vr.is_preferred());

        // The fifth no creates a clear opposing majority and flips.
        vr.register_vote(Vote::No, SCORE);
        assert!(!vr.is_preferred());
        assert_eq!(vr.confidence(), 1);
    }

    #[test]
    fn test_inconclusive_window_at_zero_confidence_changes_nothing() {
        let mut vr = record(false);

        // One yes against a no-preferring record: 1/1 yes majority flips it.
        vr.register_vote(Vote::Yes, SCORE);
        assert!(vr.is_preferred());
        assert_eq!(vr.confidence(), 1);

        // A no now ties the window (1 yes, 1 no): reset, no flip.
        vr.register_vote(Vote::No, SCORE);
        assert_eq!(vr.confidence(), 0);
        assert!(vr.is_preferred());

        // Another no: 1 yes vs 2 no is a clear no majority; flip from zero.
        vr.register_vote(Vote::No, SCORE);
        assert!(!vr.is_preferred());
        assert_eq!(vr.confidence(), 1);
    }

    #[test]
    fn test_confidence_moves_by_at_most_one_per_vote() {
        let mut vr = record(true);
        let mut prev = vr.confidence();
        let votes = [
            Vote::Yes,
            Vote::Yes,
            Vote::No,
            Vote::Neutral,
            Vote::Yes,
            Vote::No,
            Vote::No,
            Vote::No,
            Vote::No,
            Vote::Yes,
        ];
        for vote in votes.iter().cycle().take(500) {
            vr.register_vote(*vote, SCORE);
            let now = vr.confidence();
            assert!(
                now <= prev + 1,
                "confidence jumped from {prev} to {now}"
            );
            prev = now;
        }
    }

    #[test]
    fn test_terminal_record_is_immutable() {
        let mut vr = record(true);
        for _ in 0..SCORE {
            vr.register_vote(Vote::Yes, SCORE);
        }
        assert_eq!(vr.status(), Status::Finalized);

        let snapshot = (vr.preference, vr.confidence, vr.votes, vr.consider);
        for _ in 0..50 {
            assert!(!vr.register_vote(Vote::No, SCORE));
        }
        assert_eq!(
            snapshot,
            (vr.preference, vr.confidence, vr.votes, vr.consider)
        );
        assert_eq!(vr.status(), Status::Finalized);
    }

    #[test]
    fn test_inflight_tracking_saturates_at_zero() {
        let mut vr = record(true);
        vr.begin_request();
        vr.begin_request();
        assert_eq!(vr.inflight(), 2);
        vr.end_request();
        vr.end_request();
        vr.end_request();
        assert_eq!(vr.inflight(), 0);
    }

    #[test]
    fn test_confidence_saturates_at_score() {
        let mut vr = record(true);
        for _ in 0..4 {
            vr.register_vote(Vote::Yes, 4);
        }
        assert_eq!(vr.confidence(), 4);
        assert_eq!(vr.status(), Status::Finalized);
    }
}
