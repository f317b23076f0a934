//! Static validator-set chooser.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use snowfall_engine::WeightedChooser;
use snowfall_types::{PeerId, ValidatorSet};
use std::sync::{Arc, Mutex};

/// A [`WeightedChooser`] over a fixed validator set.
///
/// Seeded explicitly so simulations stay reproducible.
pub struct StakeWeightedChooser {
    validators: ValidatorSet,
    rng: Mutex<ChaCha8Rng>,
}

impl StakeWeightedChooser {
    /// Create a chooser over the given set.
    pub fn new(validators: ValidatorSet, seed: u64) -> Arc<Self> {
        Arc::new(Self {
            validators,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        })
    }

    /// Create a chooser where every peer carries equal stake.
    pub fn uniform(peers: impl IntoIterator<Item = PeerId>, seed: u64) -> Arc<Self> {
        Self::new(ValidatorSet::uniform(peers), seed)
    }
}

impl WeightedChooser for StakeWeightedChooser {
    fn weighted_random_validator(&self) -> Option<PeerId> {
        let mut rng = self.rng.lock().unwrap();
        self.validators
            .weighted_sample(&mut *rng)
            .map(|v| v.peer.clone())
    }
}
