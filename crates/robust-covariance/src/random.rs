//! Explicit random-number state for randomized estimators

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Source of randomness for an estimator
///
/// The generator is created afresh from this value on every `fit`, so a
/// `Seed` or `Generator` state makes repeated fits reproducible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum RandomState {
    /// Seed from operating-system entropy on each fit
    #[default]
    Entropy,
    /// Seed a fresh generator from this value on each fit
    Seed(u64),
    /// Clone this generator (including its stream position) on each fit
    Generator(ChaCha8Rng),
}

impl RandomState {
    /// Create the generator used by one fit
    pub fn rng(&self) -> ChaCha8Rng {
        match self {
            RandomState::Entropy => ChaCha8Rng::from_entropy(),
            RandomState::Seed(seed) => ChaCha8Rng::seed_from_u64(*seed),
            RandomState::Generator(rng) => rng.clone(),
        }
    }

    /// Whether fits driven by this state are reproducible
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, RandomState::Entropy)
    }
}

impl From<u64> for RandomState {
    fn from(seed: u64) -> Self {
        RandomState::Seed(seed)
    }
}

impl From<Option<u64>> for RandomState {
    fn from(seed: Option<u64>) -> Self {
        seed.map_or(RandomState::Entropy, RandomState::Seed)
    }
}

impl From<ChaCha8Rng> for RandomState {
    fn from(rng: ChaCha8Rng) -> Self {
        RandomState::Generator(rng)
    }
}

/// A uniformly random permutation of `0..n`
pub(crate) fn permutation(rng: &mut ChaCha8Rng, n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);
    order
}
