//! Sources of randomness used by `StreamEstimator`.
//!
//! The estimator never touches a global generator. Every coin flip and every
//! subsample is drawn from a `RandomSource` owned by the estimator instance,
//! so tests can script outcomes and parallel workers can be seeded independently.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Randomness required by the sampling scheme.
pub trait RandomSource {
    /// Flip a fair coin, returning `true` for heads.
    fn flip_coin(&mut self) -> bool;

    /// Return `amount` distinct indices drawn uniformly without replacement from `0..len`.
    /// `amount` greater than `len` is clamped to `len`.
    fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize>;
}

/// Default random source of `StreamEstimator`
pub type DefaultRandom = RngSource<StdRng>;

/// `RandomSource` backed by any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R: Rng> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    /// Wrap an existing generator
    #[inline]
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Return mutable reference to the wrapped generator
    #[inline]
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}

impl RngSource<StdRng> {
    /// Create deterministic source from `seed`
    #[inline]
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Create source seeded from operating system entropy
    #[inline]
    pub fn from_entropy() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    #[inline]
    fn flip_coin(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    #[inline]
    fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.rng, len, amount.min(len)).into_vec()
    }
}

impl<S: RandomSource + ?Sized> RandomSource for &mut S {
    #[inline]
    fn flip_coin(&mut self) -> bool {
        (**self).flip_coin()
    }

    #[inline]
    fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        (**self).sample_indices(len, amount)
    }
}

/// Derive seed of the `index`-th worker from a shared `base` seed.
///
/// Uses the SplitMix64 finalizer, so neighbouring indices produce uncorrelated seeds.
#[inline]
pub fn derive_seed(base: u64, index: u64) -> u64 {
    let mut x = base.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}
