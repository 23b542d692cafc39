//! `cvm-estimator` is a Rust crate designed to estimate the number of distinct elements in a stream
//! while keeping memory bounded.
//!
//! This library uses round-based probabilistic sampling (a variant of the CVM algorithm): a bounded
//! sample set is halved whenever it fills up and every halving doubles the weight of the remaining
//! elements. Memory bound grows adaptively when the caller reports a high error rate.
//!
//! ```
//! use cvm_estimator::StreamEstimator;
//!
//! let mut estimator = StreamEstimator::with_seed(1000, 100_000, 12345).unwrap();
//! for i in 0..100 {
//!     estimator.insert(&i);
//! }
//! assert_eq!(estimator.estimate(), 100);
//! ```
pub mod config;
pub mod driver;
pub mod error;
pub mod estimator;
pub mod history;
pub mod random;
#[cfg(feature = "with_serde")]
mod serde;

pub use config::EstimatorConfig;
pub use error::EstimatorError;
pub use estimator::StreamEstimator;
pub use random::{DefaultRandom, RandomSource, RngSource};
