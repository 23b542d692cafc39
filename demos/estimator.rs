use cvm_estimator::driver::{estimate_chunks, sum_estimates, AdaptiveRun};
use cvm_estimator::{EstimatorConfig, EstimatorError, StreamEstimator};

fn main() -> Result<(), EstimatorError> {
    let mut estimator = StreamEstimator::<usize>::with_seed(1000, 100_000, 1)?;
    for i in 0..500 {
        estimator.insert(&(i % 100));
    }
    println!("estimator estimate = {}", estimator.estimate());

    let estimator = StreamEstimator::<usize>::with_seed(16, 4096, 2)?;
    let mut run = AdaptiveRun::new(estimator, 1000)?;
    for i in 0..10_000 {
        run.feed(Some(&(i % 3000)))?;
    }
    let summary = run.finish();
    println!(
        "adaptive run: exact = {}, estimate = {}, error = {:.4}, capacity = {}",
        summary.exact, summary.estimate, summary.error_rate, summary.capacity
    );

    let chunks: Vec<Vec<Option<usize>>> = (0..4)
        .map(|c| (c * 250..(c + 1) * 250).map(Some).collect())
        .collect();
    let results = estimate_chunks(&chunks, EstimatorConfig::new(1000, 1000), 3)?;
    for chunk in &results {
        println!("chunk {} estimate = {}", chunk.index, chunk.estimate);
    }
    println!("sum of chunk estimates = {}", sum_estimates(&results));

    Ok(())
}
