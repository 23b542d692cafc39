//! Stream estimator allows to estimate number of distinct elements in a stream
//! while keeping memory bounded by an adaptive `capacity`:
//! - `capacity`: current upper bound on the sample set size, grows under
//!   `adjust_capacity` by doubling, never shrinks.
//! - `max_capacity`: immutable ceiling for `capacity`.
//!
//! # Data-structure design rationale
//!
//! ## Sample set
//! Elements are kept in a hash set (hashed with `WyHash` by default), so each element is
//! tracked at most once. While `round` is 0 and no round advance happened, the sample set
//! holds every distinct element observed so far and the estimate is exact.
//!
//! ## Rounds
//! Each time the sample set reaches `capacity`, it is replaced by a uniform subsample of
//! exactly half of its elements (rounded down) and `round` is incremented. Every retained
//! element then stands for `2^round` distinct elements of the stream:
//!
//! ```text
//! estimate = |sample| * 2^round
//! ```
//!
//! The estimate saturates at `usize::MAX` for rounds deep enough to overflow.
//!
//! ## Admission and eviction
//! - Element not in the sample set - inserted unconditionally.
//! - Element already in the sample set - up to `round + 1` fair coins are flipped and the
//!   element is removed on the first heads, so it survives an observation with probability
//!   `(1/2)^(round + 1)`.
//!
//! ## Adaptive capacity
//! The caller compares estimates against an exact reference and feeds the relative error back
//! through `adjust_capacity`. Error rates above `error_threshold` (`0.10` by default) double
//! `capacity` up to `max_capacity`.
//!
//! ## Randomness
//! Coin flips and subsampling are drawn from an owned `RandomSource`, so every instance can be
//! seeded independently and tests can script outcomes.
//!
//! Instances are not meant to be merged: two estimators that observed different chunks of a
//! stream have no sound combined estimate.

use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasherDefault, Hash, Hasher};
use std::mem::size_of;

use tracing::{debug, trace};
use wyhash::WyHash;

use crate::config::EstimatorConfig;
use crate::error::EstimatorError;
use crate::history::EstimateHistory;
use crate::random::{DefaultRandom, RandomSource, RngSource};

/// Largest number of sample slots allocated up front, larger sets grow on demand
const MAX_PREALLOCATED_SAMPLE: usize = 1024;

/// Round-based sampling estimator of distinct elements
pub struct StreamEstimator<T, R = DefaultRandom, H = WyHash>
where
    T: Hash + Eq + Clone,
    R: RandomSource,
    H: Hasher + Default,
{
    /// Current upper bound on sample set size
    capacity: usize,
    /// Ceiling for `capacity`
    max_capacity: usize,
    /// Error rate strictly above which `capacity` grows
    error_threshold: f64,
    /// Bounded working set of tracked elements
    sample: HashSet<T, BuildHasherDefault<H>>,
    /// Number of round advances performed so far
    round: u32,
    /// Values returned by `estimate`
    history: EstimateHistory,
    /// Source of coin flips and subsamples
    random: R,
}

impl<T: Hash + Eq + Clone> StreamEstimator<T> {
    /// Creates new instance of `StreamEstimator` seeded from operating system entropy
    pub fn new(capacity: usize, max_capacity: usize) -> Result<Self, EstimatorError> {
        Self::from_config(EstimatorConfig::new(capacity, max_capacity))
    }

    /// Creates new instance of `StreamEstimator` with reproducible randomness
    pub fn with_seed(
        capacity: usize,
        max_capacity: usize,
        seed: u64,
    ) -> Result<Self, EstimatorError> {
        Self::with_random(
            EstimatorConfig::new(capacity, max_capacity),
            RngSource::seeded(seed),
        )
    }

    /// Creates new instance of `StreamEstimator` from `config` seeded from operating system entropy
    pub fn from_config(config: EstimatorConfig) -> Result<Self, EstimatorError> {
        Self::with_random(config, RngSource::from_entropy())
    }
}

impl<T, R, H> StreamEstimator<T, R, H>
where
    T: Hash + Eq + Clone,
    R: RandomSource,
    H: Hasher + Default,
{
    /// Creates new instance of `StreamEstimator` drawing randomness from `random`
    pub fn with_random(config: EstimatorConfig, random: R) -> Result<Self, EstimatorError> {
        config.validate()?;

        Ok(Self {
            capacity: config.capacity,
            max_capacity: config.max_capacity,
            error_threshold: config.error_threshold,
            sample: HashSet::with_capacity_and_hasher(
                config.capacity.min(MAX_PREALLOCATED_SAMPLE),
                Default::default(),
            ),
            round: 0,
            history: EstimateHistory::new(config.history_limit),
            random,
        })
    }

    /// Observe next element of the stream. Missing elements (`None`) are ignored.
    #[inline]
    pub fn observe(&mut self, element: Option<&T>) {
        let Some(element) = element else {
            return;
        };

        if self.sample.contains(element) {
            for _ in 0..=self.round {
                if self.random.flip_coin() {
                    self.sample.remove(element);
                    break;
                }
            }
        } else {
            self.sample.insert(element.clone());
        }

        if self.sample.len() >= self.capacity {
            self.advance_round();
        }
    }

    /// Observe next non-missing element of the stream
    #[inline]
    pub fn insert(&mut self, element: &T) {
        self.observe(Some(element));
    }

    /// Replace sample set with a uniform subsample of half of its elements
    fn advance_round(&mut self) {
        let len = self.sample.len();
        let keep = len / 2;

        let mut selected = vec![false; len];
        for idx in self.random.sample_indices(len, keep) {
            if let Some(slot) = selected.get_mut(idx) {
                *slot = true;
            }
        }

        let mut selected = selected.into_iter();
        self.sample.retain(|_| selected.next().unwrap_or(false));
        self.round = self.round.saturating_add(1);

        trace!(
            round = self.round,
            kept = self.sample.len(),
            capacity = self.capacity,
            "advanced sampling round"
        );
    }

    /// Return cardinality estimate and record it in history
    #[inline]
    pub fn estimate(&mut self) -> usize {
        let estimate = self.peek_estimate();
        self.history.record(estimate);
        estimate
    }

    /// Return cardinality estimate without recording it in history
    #[inline]
    pub fn peek_estimate(&self) -> usize {
        let len = self.sample.len();
        if len == 0 {
            0
        } else if self.round >= usize::BITS || len.leading_zeros() < self.round {
            usize::MAX
        } else {
            len << self.round
        }
    }

    /// Grow capacity in response to observed `error_rate`.
    ///
    /// `error_rate` is expected to be `|exact - estimate| / exact` computed by the caller.
    /// Negative or NaN values are rejected.
    pub fn adjust_capacity(&mut self, error_rate: f64) -> Result<(), EstimatorError> {
        if error_rate.is_nan() || error_rate < 0.0 {
            return Err(EstimatorError::InvalidArgument(format!(
                "error rate must be a non-negative number, got {}",
                error_rate
            )));
        }

        if error_rate > self.error_threshold && self.capacity < self.max_capacity {
            let old_capacity = self.capacity;
            self.capacity = self.capacity.saturating_mul(2).min(self.max_capacity);
            debug!(
                error_rate,
                old_capacity,
                new_capacity = self.capacity,
                "grew sample capacity"
            );
            if self.capacity == self.max_capacity {
                debug!(max_capacity = self.max_capacity, "sample capacity saturated");
            }
        }

        Ok(())
    }

    /// Return current upper bound on sample set size
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    #[inline]
    pub fn error_threshold(&self) -> f64 {
        self.error_threshold
    }

    /// Return number of round advances performed so far
    #[inline]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Return number of elements in the sample set
    #[inline]
    pub fn len(&self) -> usize {
        self.sample.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sample.is_empty()
    }

    /// Return whether `element` is currently tracked in the sample set
    #[inline]
    pub fn contains(&self, element: &T) -> bool {
        self.sample.contains(element)
    }

    /// Iterate over elements of the sample set in arbitrary order
    pub fn sample(&self) -> impl Iterator<Item = &T> + '_ {
        self.sample.iter()
    }

    /// Return history of values returned by `estimate`
    #[inline]
    pub fn history(&self) -> &EstimateHistory {
        &self.history
    }

    /// Return mutable reference to the random source
    #[inline]
    pub fn random_mut(&mut self) -> &mut R {
        &mut self.random
    }

    /// Return approximate memory size of `StreamEstimator`, excluding heap owned by elements
    pub fn size_of(&self) -> usize {
        size_of::<Self>()
            + self.sample.capacity() * (size_of::<T>() + 1)
            + self.history.heap_size()
    }
}

impl<T, R, H> Clone for StreamEstimator<T, R, H>
where
    T: Hash + Eq + Clone,
    R: RandomSource + Clone,
    H: Hasher + Default,
{
    fn clone(&self) -> Self {
        Self {
            capacity: self.capacity,
            max_capacity: self.max_capacity,
            error_threshold: self.error_threshold,
            sample: self.sample.clone(),
            round: self.round,
            history: self.history.clone(),
            random: self.random.clone(),
        }
    }
}

impl<T, R, H> Debug for StreamEstimator<T, R, H>
where
    T: Hash + Eq + Clone,
    R: RandomSource,
    H: Hasher + Default,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ round: {}, len: {}, capacity: {}, estimate: {} }}",
            self.round,
            self.sample.len(),
            self.capacity,
            self.peek_estimate()
        )
    }
}
