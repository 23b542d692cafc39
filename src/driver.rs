//! Helpers driving `StreamEstimator` over a stream.
//!
//! `AdaptiveRun` closes the feedback loop between accuracy and memory: it keeps an exact
//! reference count next to the estimator, compares both every `window` elements and feeds
//! the relative error back into `adjust_capacity`.
//!
//! `estimate_chunks` runs one independent estimator per chunk on scoped threads. Chunk
//! estimates are reported side by side and are never merged into a single cardinality:
//! elements shared by several chunks are counted once per chunk.

use std::collections::HashSet;
use std::hash::{BuildHasherDefault, Hash, Hasher};
use std::thread;

use tracing::{debug, trace};
use wyhash::WyHash;

use crate::config::EstimatorConfig;
use crate::error::EstimatorError;
use crate::estimator::StreamEstimator;
use crate::random::{derive_seed, DefaultRandom, RandomSource, RngSource};

/// Return relative error `|exact - estimate| / exact`, or `0.0` for an empty reference
#[inline]
pub fn relative_error(exact: usize, estimate: usize) -> f64 {
    if exact == 0 {
        return 0.0;
    }
    (exact as f64 - estimate as f64).abs() / exact as f64
}

/// Comparison of estimate and exact count taken at the end of a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    /// Number of non-missing elements observed so far
    pub observed: u64,
    /// Exact number of distinct elements observed so far
    pub exact: usize,
    pub estimate: usize,
    pub error_rate: f64,
    /// Capacity after the error rate was fed back
    pub capacity: usize,
    pub round: u32,
}

/// Final state of an `AdaptiveRun`
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub observed: u64,
    pub exact: usize,
    pub estimate: usize,
    pub error_rate: f64,
    pub capacity: usize,
    pub round: u32,
    pub checkpoints: Vec<Checkpoint>,
}

/// Estimator paired with an exact reference and periodic capacity feedback
pub struct AdaptiveRun<T, R = DefaultRandom, H = WyHash>
where
    T: Hash + Eq + Clone,
    R: RandomSource,
    H: Hasher + Default,
{
    estimator: StreamEstimator<T, R, H>,
    exact: HashSet<T, BuildHasherDefault<H>>,
    window: usize,
    observed: u64,
    pending: usize,
    checkpoints: Vec<Checkpoint>,
}

impl<T, R, H> AdaptiveRun<T, R, H>
where
    T: Hash + Eq + Clone,
    R: RandomSource,
    H: Hasher + Default,
{
    /// Create run comparing estimate against exact count every `window` non-missing elements
    pub fn new(estimator: StreamEstimator<T, R, H>, window: usize) -> Result<Self, EstimatorError> {
        if window == 0 {
            return Err(EstimatorError::InvalidConfiguration(
                "comparison window must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            estimator,
            exact: HashSet::default(),
            window,
            observed: 0,
            pending: 0,
            checkpoints: Vec::new(),
        })
    }

    /// Feed next element. Returns checkpoint when the element closed a comparison window.
    pub fn feed(&mut self, element: Option<&T>) -> Result<Option<Checkpoint>, EstimatorError> {
        let Some(element) = element else {
            return Ok(None);
        };

        self.estimator.insert(element);
        if !self.exact.contains(element) {
            self.exact.insert(element.clone());
        }
        self.observed += 1;
        self.pending += 1;

        if self.pending < self.window {
            return Ok(None);
        }
        self.pending = 0;
        self.checkpoint().map(Some)
    }

    /// Feed all elements of `elements` in order
    pub fn feed_all<'a, I>(&mut self, elements: I) -> Result<(), EstimatorError>
    where
        I: IntoIterator<Item = Option<&'a T>>,
        T: 'a,
    {
        for element in elements {
            self.feed(element)?;
        }
        Ok(())
    }

    fn checkpoint(&mut self) -> Result<Checkpoint, EstimatorError> {
        let exact = self.exact.len();
        let estimate = self.estimator.estimate();
        let error_rate = relative_error(exact, estimate);
        self.estimator.adjust_capacity(error_rate)?;

        let checkpoint = Checkpoint {
            observed: self.observed,
            exact,
            estimate,
            error_rate,
            capacity: self.estimator.capacity(),
            round: self.estimator.round(),
        };
        debug!(
            observed = checkpoint.observed,
            exact,
            estimate,
            error_rate,
            capacity = checkpoint.capacity,
            "estimate checkpoint"
        );
        self.checkpoints.push(checkpoint);
        Ok(checkpoint)
    }

    /// Return checkpoints taken so far
    #[inline]
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    #[inline]
    pub fn estimator(&self) -> &StreamEstimator<T, R, H> {
        &self.estimator
    }

    /// Return exact number of distinct elements observed so far
    #[inline]
    pub fn exact(&self) -> usize {
        self.exact.len()
    }

    /// Take a final estimate and consume the run. Capacity is not adjusted anymore.
    pub fn finish(mut self) -> RunSummary {
        let exact = self.exact.len();
        let estimate = self.estimator.estimate();
        RunSummary {
            observed: self.observed,
            exact,
            estimate,
            error_rate: relative_error(exact, estimate),
            capacity: self.estimator.capacity(),
            round: self.estimator.round(),
            checkpoints: self.checkpoints,
        }
    }
}

/// Final estimate of a single chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkEstimate {
    /// Position of the chunk in the input
    pub index: usize,
    /// Number of non-missing elements in the chunk
    pub observed: u64,
    pub estimate: usize,
    pub round: u32,
    pub capacity: usize,
}

/// Estimate every chunk with its own estimator on a separate thread.
///
/// Estimator of chunk `i` is seeded with `derive_seed(base_seed, i)`, so results are
/// reproducible for a fixed `base_seed`. Results are returned in chunk order.
pub fn estimate_chunks<T, C>(
    chunks: &[C],
    config: EstimatorConfig,
    base_seed: u64,
) -> Result<Vec<ChunkEstimate>, EstimatorError>
where
    T: Hash + Eq + Clone + Sync,
    C: AsRef<[Option<T>]> + Sync,
{
    config.validate()?;

    thread::scope(|scope| {
        let handles: Vec<_> = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| {
                scope.spawn(move || estimate_chunk(index, chunk.as_ref(), config, base_seed))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect()
    })
}

fn estimate_chunk<T>(
    index: usize,
    chunk: &[Option<T>],
    config: EstimatorConfig,
    base_seed: u64,
) -> Result<ChunkEstimate, EstimatorError>
where
    T: Hash + Eq + Clone,
{
    let random = RngSource::seeded(derive_seed(base_seed, index as u64));
    let mut estimator = StreamEstimator::<T>::with_random(config, random)?;
    let mut observed = 0;
    for element in chunk {
        if element.is_some() {
            observed += 1;
        }
        estimator.observe(element.as_ref());
    }

    let result = ChunkEstimate {
        index,
        observed,
        estimate: estimator.estimate(),
        round: estimator.round(),
        capacity: estimator.capacity(),
    };
    trace!(
        index,
        observed,
        estimate = result.estimate,
        "chunk estimated"
    );
    Ok(result)
}

/// Sum of chunk estimates, saturating at `usize::MAX`.
///
/// This is the naive per-chunk total, not a cardinality of the union of chunks: elements
/// present in several chunks are counted once per chunk.
pub fn sum_estimates(estimates: &[ChunkEstimate]) -> usize {
    estimates
        .iter()
        .fold(0usize, |acc, e| acc.saturating_add(e.estimate))
}
