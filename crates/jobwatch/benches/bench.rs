use core::hint::black_box;
use core::time::Duration;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use jobwatch::{Distributor, DistributorConfig, Job, Snapshot};

// Number of jobs dispatched per benchmark iteration.
const TOTAL_JOBS: u64 = 4096;

fn queue() -> Vec<Job> {
    (1..=TOTAL_JOBS)
        .map(|id| Job::new(id, Duration::ZERO))
        .collect()
}

/// Measures signal throughput through the conduits with no simulated work, so
/// the rendezvous handoff to the aggregator dominates.
fn bench_distributor(c: &mut Criterion) {
    let mut group = c.benchmark_group("distributor");
    group.throughput(Throughput::Elements(TOTAL_JOBS));

    for threads in [1, 2, 4, 8] {
        let distributor = Distributor::new(
            DistributorConfig::default()
                .with_threads(threads)
                .with_report_interval(Duration::from_secs(60)),
        )
        .unwrap();

        group.bench_function(format!("threads/{threads}"), |b| {
            b.iter_batched(
                queue,
                |jobs| {
                    let summary = distributor
                        .run(jobs, |snapshot: &Snapshot| {
                            black_box(snapshot);
                        })
                        .unwrap();
                    black_box(summary);
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_distributor);
criterion_main!(benches);
