use core::time::Duration;
use jobwatch::Job;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Builds a queue of `count` jobs with ids `1..=count` and a uniformly random
/// workload in `[min, max]`, at millisecond resolution.
///
/// With a `seed` the queue is reproducible; without one it is drawn from the
/// thread-local generator.
///
/// # Panics
///
/// Panics if `min` is greater than `max`; [`RunConfig`] rejects that case.
///
/// [`RunConfig`]: super::config::RunConfig
pub fn generate_queue(count: u64, min: Duration, max: Duration, seed: Option<u64>) -> Vec<Job> {
    match seed {
        Some(seed) => build(count, min, max, &mut StdRng::seed_from_u64(seed)),
        None => build(count, min, max, &mut rand::rng()),
    }
}

fn build<R: Rng>(count: u64, min: Duration, max: Duration, rng: &mut R) -> Vec<Job> {
    let min_ms = min.as_millis() as u64;
    let max_ms = max.as_millis() as u64;

    (1..=count)
        .map(|id| {
            let workload = Duration::from_millis(rng.random_range(min_ms..=max_ms));
            Job::new(id, workload)
        })
        .collect()
}
