//! Static partitioning of a job queue across worker threads.
//!
//! A [`Distributor`] owns the channel lifecycle of a run:
//!
//! 1. Open both conduits and the log, start the aggregator and reporter.
//! 2. Split the queue into contiguous segments and move each into its own
//!    worker thread.
//! 3. Join every worker.
//! 4. Drop the last sender so both conduits close, join the aggregator (which
//!    consumes anything still pending before it observes closure), then stop
//!    the reporter.
//!
//! Segment assignment is fixed at launch. There is no redistribution or work
//! stealing.

use crate::{
    aggregator::{Aggregator, AggregatorStats},
    conduit::{self, SignalSender},
    error::{Error, Result},
    job::{Execute, JobId},
    log::{Log, Snapshot},
    reporter::{ReportSink, Reporter},
};
use core::time::Duration;
use std::thread;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// How a queue of `N` jobs is split over `threads` workers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Every segment holds `N / threads` jobs. The trailing `N % threads` jobs
    /// are never dispatched and are reported in [`RunSummary::skipped`].
    #[default]
    Truncate,
    /// The first `N % threads` segments hold one extra job, so every job is
    /// dispatched.
    Spread,
}

impl Partition {
    /// Returns the length of each of the `threads` segments for a queue of
    /// `len` jobs.
    pub fn segment_lengths(self, len: usize, threads: usize) -> Vec<usize> {
        if threads == 0 {
            return Vec::new();
        }

        let base = len / threads;
        let extra = len % threads;
        (0..threads)
            .map(|i| match self {
                Self::Truncate => base,
                Self::Spread => base + usize::from(i < extra),
            })
            .collect()
    }
}

/// Splits `jobs` into contiguous segments according to `partition`.
///
/// Returns the segments in queue order and the jobs that were not assigned to
/// any segment.
pub fn split_segments<J>(
    jobs: Vec<J>,
    threads: usize,
    partition: Partition,
) -> (Vec<Vec<J>>, Vec<J>) {
    let lengths = partition.segment_lengths(jobs.len(), threads);
    let mut rest = jobs.into_iter();
    let segments = lengths
        .into_iter()
        .map(|len| rest.by_ref().take(len).collect())
        .collect();
    (segments, rest.collect())
}

/// Run parameters for a [`Distributor`].
#[derive(Clone, Debug)]
pub struct DistributorConfig {
    /// Number of worker threads, one per segment.
    pub threads: usize,
    /// Time between two reports.
    pub report_interval: Duration,
    pub partition: Partition,
    /// Checked by every worker before it starts a job.
    pub cancel: CancellationToken,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            report_interval: Duration::from_secs(2),
            partition: Partition::Truncate,
            cancel: CancellationToken::new(),
        }
    }
}

impl DistributorConfig {
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    #[must_use]
    pub const fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_partition(mut self, partition: Partition) -> Self {
        self.partition = partition;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for zero threads or a zero report
    /// interval.
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(Error::InvalidConfig {
                reason: "threads must be greater than zero".into(),
            });
        }
        if self.report_interval.is_zero() {
            return Err(Error::InvalidConfig {
                reason: "report interval must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

/// Per-worker tally of a finished segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SegmentOutcome {
    pub completed: usize,
    pub failed: usize,
    /// Jobs never started because the run was cancelled.
    pub abandoned: usize,
}

/// Result of [`Distributor::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Final state of the log after the drain.
    pub snapshot: Snapshot,
    /// Signal counts as seen by the aggregator.
    pub stats: AggregatorStats,
    /// Number of jobs assigned to a worker.
    pub dispatched: usize,
    /// Jobs that were never assigned to a worker.
    pub skipped: Vec<JobId>,
    /// Assigned jobs that were not started because the run was cancelled.
    pub abandoned: usize,
}

/// Runs a batch of jobs over a fixed pool of worker threads.
#[derive(Clone, Debug, Default)]
pub struct Distributor {
    config: DistributorConfig,
}

impl Distributor {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration does not pass
    /// [`DistributorConfig::validate`].
    pub fn new(config: DistributorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Executes `jobs` and returns the settled log.
    ///
    /// Blocks until every worker has joined and the aggregator has drained
    /// both conduits. Job failures are recorded in the log and never abort the
    /// run.
    ///
    /// # Errors
    ///
    /// - [`Error::Spawn`] if a thread could not be started.
    /// - [`Error::ThreadPanicked`] if a worker, the aggregator or the reporter
    ///   panicked.
    /// - [`Error::ChannelClosed`] if a worker lost its connection to the
    ///   aggregator.
    /// - Any error returned by [`Execute::execute`] that is not a job failure.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(jobs = jobs.len(), threads = self.config.threads))
    )]
    pub fn run<J, S>(&self, jobs: Vec<J>, sink: S) -> Result<RunSummary>
    where
        J: Execute + Send,
        S: ReportSink,
    {
        let (segments, skipped) = split_segments(jobs, self.config.threads, self.config.partition);
        let skipped: Vec<JobId> = skipped.iter().map(Execute::id).collect();
        let dispatched: usize = segments.iter().map(Vec::len).sum();

        #[cfg(feature = "tracing")]
        if !skipped.is_empty() {
            tracing::warn!(
                "{} trailing job(s) not dispatched: {:?}",
                skipped.len(),
                skipped
            );
        }

        let (tx, rx) = conduit::open();
        let (writer, reader) = Log::shared();

        let (stats, outcomes) = thread::scope(|s| -> Result<_> {
            let aggregator = thread::Builder::new()
                .name("jobwatch-aggregator".into())
                .spawn_scoped(s, move || Aggregator::new(rx, writer).run())?;

            // On early return `tx` is dropped with this closure, so the
            // aggregator still observes closure and the scope can join it.
            let reporter =
                Reporter::new(reader.clone(), self.config.report_interval, sink).spawn_scoped(s)?;

            let mut workers = Vec::with_capacity(segments.len());
            let mut spawn_err = None;
            for (worker_id, segment) in segments.into_iter().enumerate() {
                let tx = tx.clone();
                let cancel = self.config.cancel.clone();
                let spawned = thread::Builder::new()
                    .name(format!("jobwatch-worker-{worker_id}"))
                    .spawn_scoped(s, move || process_segment(worker_id, segment, &tx, &cancel));
                match spawned {
                    Ok(handle) => workers.push((worker_id, handle)),
                    Err(e) => {
                        spawn_err = Some(Error::from(e));
                        break;
                    }
                }
            }

            // The distributor's own sender must go before the drain, otherwise
            // the conduits never close.
            drop(tx);

            let mut outcomes = Vec::with_capacity(workers.len());
            let mut first_err = spawn_err;
            for (worker_id, handle) in workers {
                match handle.join() {
                    Ok(Ok(outcome)) => outcomes.push(outcome),
                    Ok(Err(e)) => {
                        first_err.get_or_insert(e);
                    }
                    Err(_) => {
                        first_err.get_or_insert(Error::ThreadPanicked {
                            name: format!("jobwatch-worker-{worker_id}"),
                        });
                    }
                }
            }

            #[cfg(feature = "tracing")]
            tracing::debug!("All workers joined, draining conduits");

            let stats = aggregator.join().map_err(|_| Error::ThreadPanicked {
                name: "jobwatch-aggregator".into(),
            });
            let stopped = reporter.stop();

            if let Some(e) = first_err {
                return Err(e);
            }
            let stats = stats?;
            stopped?;
            Ok((stats, outcomes))
        })?;

        let abandoned: usize = outcomes.iter().map(|o| o.abandoned).sum();
        let snapshot = reader.snapshot();

        #[cfg(feature = "tracing")]
        tracing::info!(
            running = snapshot.running.len(),
            complete = snapshot.complete.len(),
            failed = snapshot.failed.len(),
            skipped = skipped.len(),
            abandoned,
            "Run finished"
        );

        Ok(RunSummary {
            snapshot,
            stats,
            dispatched,
            skipped,
            abandoned,
        })
    }
}

/// Executes one segment in order, emitting a start signal before each job and
/// a completion or failure signal after it.
///
/// Cancellation is checked between jobs only. A started job always runs to
/// the end and sends its terminal signal. A job error that is not a job
/// failure (see [`Error::is_job_failure`]) is recorded as `Failed` and then
/// stops the segment.
fn process_segment<J: Execute>(
    _worker_id: usize,
    segment: Vec<J>,
    tx: &SignalSender,
    cancel: &CancellationToken,
) -> Result<SegmentOutcome> {
    #[cfg(feature = "tracing")]
    tracing::debug!("Worker {_worker_id} started with {} job(s)", segment.len());

    let mut outcome = SegmentOutcome::default();
    let total = segment.len();

    for (idx, mut job) in segment.into_iter().enumerate() {
        if cancel.is_cancelled() {
            outcome.abandoned = total - idx;
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "Worker {_worker_id} cancelled, abandoning {} job(s)",
                outcome.abandoned
            );
            break;
        }

        let id = job.id();
        tx.started(id)?;
        match job.execute() {
            Ok(()) => {
                tx.completed(id)?;
                outcome.completed += 1;
            }
            Err(e) if e.is_job_failure() => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {_worker_id}: {e}");
                tx.failed(id)?;
                outcome.failed += 1;
            }
            Err(e) => {
                // The job still settles in the log before the run is aborted.
                #[cfg(feature = "tracing")]
                tracing::error!("Worker {_worker_id} aborting segment: {e}");
                tx.failed(id)?;
                return Err(e);
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("Worker {_worker_id} finished: {outcome:?}");

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_drops_the_remainder() {
        assert_eq!(Partition::Truncate.segment_lengths(10, 4), vec![2, 2, 2, 2]);
        let (segments, rest) = split_segments((1..=10).collect(), 4, Partition::Truncate);
        assert_eq!(segments, vec![vec![1, 2], vec![3, 4], vec![5, 6], vec![7, 8]]);
        assert_eq!(rest, vec![9, 10]);
    }

    #[test]
    fn spread_assigns_every_job() {
        assert_eq!(Partition::Spread.segment_lengths(10, 4), vec![3, 3, 2, 2]);
        let (segments, rest) = split_segments((1..=10).collect(), 4, Partition::Spread);
        assert_eq!(
            segments,
            vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8], vec![9, 10]]
        );
        assert!(rest.is_empty());
    }

    #[test]
    fn more_threads_than_jobs() {
        let (segments, rest) = split_segments(vec![1, 2], 3, Partition::Truncate);
        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(Vec::is_empty));
        assert_eq!(rest, vec![1, 2]);

        let (segments, rest) = split_segments(vec![1, 2], 3, Partition::Spread);
        assert_eq!(segments, vec![vec![1], vec![2], vec![]]);
        assert!(rest.is_empty());
    }

    #[test]
    fn even_split_has_no_remainder() {
        let (segments, rest) = split_segments((1..=8).collect::<Vec<u64>>(), 2, Partition::Truncate);
        assert_eq!(segments, vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]]);
        assert!(rest.is_empty());
    }

    #[test]
    fn config_rejects_zero_threads_and_interval() {
        assert!(matches!(
            Distributor::new(DistributorConfig::default().with_threads(0)),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(matches!(
            Distributor::new(DistributorConfig::default().with_report_interval(Duration::ZERO)),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(Distributor::new(DistributorConfig::default()).is_ok());
    }
}
