//! ## Estimate history
//! Diagnostic record of values returned by `StreamEstimator::estimate`.
//!
//! History is bounded: once `limit` values are stored, recording a new value
//! evicts the oldest one. A limit of `0` disables recording entirely while
//! still counting how many estimates were taken.

use std::collections::VecDeque;
use std::mem::size_of;

/// Default maximum number of retained estimates
pub const DEFAULT_HISTORY_LIMIT: usize = 1024;

/// Bounded, ordered record of estimates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateHistory {
    /// Retained estimates, oldest first
    values: VecDeque<usize>,
    /// Maximum number of retained estimates
    limit: usize,
    /// Number of estimates ever recorded, including evicted ones
    total: u64,
}

impl EstimateHistory {
    /// Create empty history retaining at most `limit` values
    pub fn new(limit: usize) -> Self {
        Self {
            values: VecDeque::new(),
            limit,
            total: 0,
        }
    }

    /// Append `estimate`, evicting the oldest value when full
    #[inline]
    pub fn record(&mut self, estimate: usize) {
        self.total += 1;
        if self.limit == 0 {
            return;
        }
        if self.values.len() == self.limit {
            self.values.pop_front();
        }
        self.values.push_back(estimate);
    }

    /// Iterate over retained estimates in call order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.values.iter().copied()
    }

    /// Return most recently recorded estimate
    #[inline]
    pub fn last(&self) -> Option<usize> {
        self.values.back().copied()
    }

    /// Return number of retained estimates
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Return number of estimates ever recorded
    #[inline]
    pub fn total_recorded(&self) -> u64 {
        self.total
    }

    /// Drop retained estimates and reset the total counter
    pub fn clear(&mut self) {
        self.values.clear();
        self.total = 0;
    }

    /// Return approximate heap memory used by retained estimates
    pub(crate) fn heap_size(&self) -> usize {
        self.values.capacity() * size_of::<usize>()
    }
}

impl Default for EstimateHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
