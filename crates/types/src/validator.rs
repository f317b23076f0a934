//! Validator set with stake-weighted sampling.

use crate::PeerId;
use rand::Rng;

/// A single validator eligible to be polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorInfo {
    /// The peer behind this validator.
    pub peer: PeerId,
    /// Stake weight. Zero-stake validators are never sampled.
    pub stake: u64,
}

impl ValidatorInfo {
    pub fn new(peer: impl Into<PeerId>, stake: u64) -> Self {
        Self {
            peer: peer.into(),
            stake,
        }
    }
}

/// A set of stake-weighted validators.
///
/// Supports sampling a validator with probability proportional to stake,
/// which is what the poll scheduler needs from its chooser.
#[derive(Debug, Clone, Default)]
pub struct ValidatorSet {
    validators: Vec<ValidatorInfo>,
    total_stake: u64,
}

impl ValidatorSet {
    /// Build a set from validator infos.
    pub fn new(validators: Vec<ValidatorInfo>) -> Self {
        let total_stake = validators.iter().map(|v| v.stake).sum();
        Self {
            validators,
            total_stake,
        }
    }

    /// Build a set where every peer carries equal stake.
    pub fn uniform(peers: impl IntoIterator<Item = PeerId>) -> Self {
        Self::new(
            peers
                .into_iter()
                .map(|peer| ValidatorInfo { peer, stake: 1 })
                .collect(),
        )
    }

    /// All validators in the set.
    pub fn validators(&self) -> &[ValidatorInfo] {
        &self.validators
    }

    /// Sum of all stake weights.
    pub fn total_stake(&self) -> u64 {
        self.total_stake
    }

    /// Number of validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Sample a validator with probability proportional to stake.
    ///
    /// Returns `None` when the set is empty or carries no stake.
    pub fn weighted_sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&ValidatorInfo> {
        if self.total_stake == 0 {
            return None;
        }
        let mut point = rng.gen_range(0..self.total_stake);
        for validator in &self.validators {
            if point < validator.stake {
                return Some(validator);
            }
            point -= validator.stake;
        }
        // Unreachable while total_stake equals the sum of weights.
        self.validators.last()
    }
}
