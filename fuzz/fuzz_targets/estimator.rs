#![no_main]

use cvm_estimator::StreamEstimator;
use libfuzzer_sys::fuzz_target;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let capacity = usize::from(data[0] % 32) + 1;
    let seed = wyhash(data, 0);
    let mut estimator = StreamEstimator::<&[u8]>::with_seed(capacity, 256, seed).unwrap();

    let mut round = 0;
    for chunk in data[1..].chunks(2) {
        if chunk[0] == 0 {
            estimator.observe(None);
        } else {
            estimator.insert(&chunk);
        }
        if chunk[0] == 0xff {
            estimator.adjust_capacity(f64::from(chunk[0])).unwrap();
        }

        assert!(estimator.len() < estimator.capacity());
        assert!(estimator.capacity() <= estimator.max_capacity());
        assert!(estimator.round() == round || estimator.round() == round + 1);
        round = estimator.round();
    }

    if estimator.round() == 0 {
        assert_eq!(estimator.estimate(), estimator.len());
    }
});
