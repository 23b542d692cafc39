#![no_main]

use cvm_estimator::{EstimatorConfig, RngSource, StreamEstimator};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<EstimatorConfig>(data) {
        let mut estimator =
            StreamEstimator::<usize>::with_random(config, RngSource::seeded(1)).unwrap();
        estimator.insert(&1);
        assert!(estimator.len() <= 1);
    }
});
