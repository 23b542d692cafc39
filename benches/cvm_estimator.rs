#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::collections::HashSet;
use std::hash::BuildHasherDefault;

use criterion::measurement::WallTime;
use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion, Throughput,
};
use cvm_estimator::StreamEstimator;
use hyperloglogplus::HyperLogLog as HyperLogLogTrait;
use pprof::criterion::{Output, PProfProfiler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabled::settings::{Settings, Style};
use tabled::{Table, Tabled};
use wyhash::WyHash;

/// Insert and estimate operations are benchmarked against cardinalities ranging from 0 to
/// `DEFAULT_MAX_CARDINALITY` or environment variable `N` (if defined) with cardinality doubled
/// with every iteration as [0, 1, 2, ..., N].
const DEFAULT_MAX_CARDINALITY: usize = 256;
/// Every benchmarked stream draws `STREAM_FACTOR * cardinality` elements from `0..cardinality`.
const STREAM_FACTOR: usize = 4;

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Protobuf));
    targets = benchmark
}
criterion_main!(benches);

fn benchmark(c: &mut Criterion) {
    let bench_results_path = std::env::var("BENCH_RESULTS_PATH").unwrap_or_else(|_| ".".into());
    let max_cardinality = std::env::var("N")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CARDINALITY);

    let cardinalities: Vec<usize> = std::iter::once(0)
        .chain((0..).map(|c| 1 << c))
        .take_while(|&c| c <= max_cardinality)
        .collect();

    let mut group = c.benchmark_group("insert");
    for &cardinality in &cardinalities {
        group.throughput(Throughput::Elements(cardinality.max(1) as u64));
        bench_insert::<Cvm<64>>(&mut group, cardinality);
        bench_insert::<Cvm<1024>>(&mut group, cardinality);
        bench_insert::<ProbabilisticCollections>(&mut group, cardinality);
        bench_insert::<HyperLogLogPlus>(&mut group, cardinality);
    }
    group.finish();

    let mut group = c.benchmark_group("estimate");
    group.throughput(Throughput::Elements(1));
    for &cardinality in &cardinalities {
        bench_estimate::<Cvm<64>>(&mut group, cardinality);
        bench_estimate::<Cvm<1024>>(&mut group, cardinality);
        bench_estimate::<ProbabilisticCollections>(&mut group, cardinality);
        bench_estimate::<HyperLogLogPlus>(&mut group, cardinality);
    }
    group.finish();

    let results: Vec<StatRecord> = cardinalities
        .iter()
        .map(|&cardinality| StatRecord {
            cardinality,
            cvm_64: measure_allocations::<Cvm<64>>(cardinality),
            cvm_1024: measure_allocations::<Cvm<1024>>(cardinality),
            probabilistic_collections: measure_allocations::<ProbabilisticCollections>(cardinality),
            hyperloglogplus: measure_allocations::<HyperLogLogPlus>(cardinality),
        })
        .collect();

    let table_config = Settings::default().with(Style::markdown());
    write_report(
        &format!("{}/memory_usage.md", bench_results_path),
        Table::new(results).with(table_config).to_string(),
    );

    let results: Vec<StatRecord> = cardinalities
        .iter()
        .map(|&cardinality| StatRecord {
            cardinality,
            cvm_64: measure_error::<Cvm<64>>(cardinality),
            cvm_1024: measure_error::<Cvm<1024>>(cardinality),
            probabilistic_collections: measure_error::<ProbabilisticCollections>(cardinality),
            hyperloglogplus: measure_error::<HyperLogLogPlus>(cardinality),
        })
        .collect();

    let table_config = Settings::default().with(Style::markdown());
    write_report(
        &format!("{}/relative_error.md", bench_results_path),
        Table::new(results).with(table_config).to_string(),
    );
}

fn write_report(path: &str, report: String) {
    if let Err(err) = std::fs::write(path, &report) {
        eprintln!("failed to write {}: {}", path, err);
        println!("{}", report);
    }
}

/// Stream of `STREAM_FACTOR * cardinality` elements drawn from `0..cardinality`
fn stream(cardinality: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..cardinality * STREAM_FACTOR)
        .map(|_| rng.gen_range(0..cardinality))
        .collect()
}

/// Cardinality estimator trait representing common estimator operations.
trait CardinalityEstimatorTrait {
    fn new() -> Self;
    fn insert(&mut self, item: &usize);
    fn estimate(&mut self) -> usize;
    fn name() -> String;
}

fn bench_insert<E: CardinalityEstimatorTrait>(
    group: &mut BenchmarkGroup<WallTime>,
    cardinality: usize,
) {
    let items = stream(cardinality, 12345);
    group.bench_with_input(BenchmarkId::new(E::name(), cardinality), &items, |b, items| {
        b.iter(|| {
            let mut estimator = E::new();
            for item in black_box(items) {
                estimator.insert(black_box(item));
            }
        });
    });
}

fn bench_estimate<E: CardinalityEstimatorTrait>(
    group: &mut BenchmarkGroup<WallTime>,
    cardinality: usize,
) {
    let items = stream(cardinality, 12345);
    group.bench_with_input(BenchmarkId::new(E::name(), cardinality), &items, |b, items| {
        let mut estimator = E::new();
        for item in items {
            estimator.insert(item);
        }
        b.iter(|| estimator.estimate());
    });
}

fn measure_allocations<E: CardinalityEstimatorTrait>(cardinality: usize) -> String {
    let items = stream(cardinality, 12345);
    let _profiler = dhat::Profiler::builder().testing().build();
    let mut estimator = E::new();
    for item in &items {
        estimator.insert(item);
    }
    let stats = dhat::HeapStats::get();
    format!(
        "{} / {} / {}",
        std::mem::size_of::<E>(),
        stats.max_bytes,
        stats.total_blocks,
    )
}

fn measure_error<E: CardinalityEstimatorTrait>(cardinality: usize) -> String {
    let n = 100;
    let mut total_relative_error: f64 = 0.0;
    for seed in 0..n {
        let items = stream(cardinality, seed);
        let exact = items.iter().collect::<HashSet<_>>().len();
        let mut estimator = E::new();
        for item in &items {
            estimator.insert(item);
        }
        total_relative_error += cvm_estimator::driver::relative_error(exact, estimator.estimate());
    }
    let avg_relative_error = total_relative_error / (n as f64);

    if avg_relative_error < 1.0 {
        format!("{:.4}", avg_relative_error)
    } else {
        format!("{:.2e}", avg_relative_error)
    }
}

#[derive(Tabled)]
struct StatRecord {
    cardinality: usize,
    cvm_64: String,
    cvm_1024: String,
    probabilistic_collections: String,
    hyperloglogplus: String,
}

struct Cvm<const C: usize>(StreamEstimator<usize>);

impl<const C: usize> CardinalityEstimatorTrait for Cvm<C> {
    fn new() -> Self {
        let config = cvm_estimator::EstimatorConfig::new(C, C).with_history_limit(0);
        Self(
            StreamEstimator::with_random(config, cvm_estimator::RngSource::seeded(12345))
                .unwrap(),
        )
    }

    fn insert(&mut self, item: &usize) {
        self.0.insert(item);
    }

    fn estimate(&mut self) -> usize {
        self.0.estimate()
    }

    fn name() -> String {
        format!("cvm-estimator-{}", C)
    }
}

struct ProbabilisticCollections(probabilistic_collections::hyperloglog::HyperLogLog<usize>);

impl CardinalityEstimatorTrait for ProbabilisticCollections {
    fn new() -> Self {
        Self(probabilistic_collections::hyperloglog::HyperLogLog::new(
            0.004,
        ))
    }

    fn insert(&mut self, item: &usize) {
        self.0.insert(item);
    }

    fn estimate(&mut self) -> usize {
        self.0.len() as usize
    }

    fn name() -> String {
        "probabilistic-collections".to_string()
    }
}

struct HyperLogLogPlus(hyperloglogplus::HyperLogLogPlus<usize, BuildHasherDefault<WyHash>>);

impl CardinalityEstimatorTrait for HyperLogLogPlus {
    fn new() -> Self {
        Self(
            hyperloglogplus::HyperLogLogPlus::new(12, BuildHasherDefault::<WyHash>::default())
                .unwrap(),
        )
    }

    fn insert(&mut self, item: &usize) {
        self.0.insert(item);
    }

    fn estimate(&mut self) -> usize {
        self.0.count() as usize
    }

    fn name() -> String {
        "hyperloglogplus".to_string()
    }
}
