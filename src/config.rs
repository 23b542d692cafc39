//! Construction parameters of `StreamEstimator`.

use crate::error::EstimatorError;
use crate::history::DEFAULT_HISTORY_LIMIT;

/// Default initial sample capacity
pub const DEFAULT_CAPACITY: usize = 1000;
/// Default ceiling for adaptive capacity growth
pub const DEFAULT_MAX_CAPACITY: usize = 100_000;
/// Error rate above which `adjust_capacity` doubles the capacity
pub const DEFAULT_ERROR_THRESHOLD: f64 = 0.10;

/// Configuration of a `StreamEstimator`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    /// Initial upper bound on the sample set size
    pub capacity: usize,
    /// Immutable ceiling for `capacity`
    pub max_capacity: usize,
    /// Error rate strictly above which capacity grows
    pub error_threshold: f64,
    /// Number of estimates retained in history, `0` disables history
    pub history_limit: usize,
}

impl EstimatorConfig {
    /// Create configuration with given bounds and default threshold and history limit
    pub fn new(capacity: usize, max_capacity: usize) -> Self {
        Self {
            capacity,
            max_capacity,
            ..Self::default()
        }
    }

    pub fn with_error_threshold(mut self, error_threshold: f64) -> Self {
        self.error_threshold = error_threshold;
        self
    }

    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// Check that configuration describes a usable estimator
    pub fn validate(&self) -> Result<(), EstimatorError> {
        if self.capacity == 0 {
            return Err(EstimatorError::InvalidConfiguration(
                "capacity must be greater than zero".to_string(),
            ));
        }
        if self.max_capacity < self.capacity {
            return Err(EstimatorError::InvalidConfiguration(format!(
                "max_capacity {} is less than capacity {}",
                self.max_capacity, self.capacity
            )));
        }
        if !self.error_threshold.is_finite() || self.error_threshold < 0.0 {
            return Err(EstimatorError::InvalidConfiguration(format!(
                "error_threshold must be a non-negative finite number, got {}",
                self.error_threshold
            )));
        }
        Ok(())
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_capacity: DEFAULT_MAX_CAPACITY,
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}
