use thiserror::Error;

/// Errors reported by `StreamEstimator` and its helpers.
///
/// A missing element passed to `observe` is not an error and never shows up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimatorError {
    /// Rejected construction parameters. The instance is never created.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Caller passed an argument outside of the accepted domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
