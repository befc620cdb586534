use crate::{
    conduit::{Failure, Signal, SignalReceiver},
    log::{JobState, LogWriter},
};
use crossbeam_channel::{never, select};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Number of signals the aggregator consumed, per kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregatorStats {
    pub started: usize,
    pub completed: usize,
    pub failed: usize,
}

impl AggregatorStats {
    /// Number of terminal signals (completed or failed).
    pub const fn terminal(&self) -> usize {
        self.completed + self.failed
    }
}

/// Single consumer of both conduits and sole writer of the log.
///
/// Construct it with the [`SignalReceiver`] returned by
/// [`conduit::open`](crate::conduit::open) and the [`LogWriter`] returned by
/// [`Log::shared`](crate::Log::shared), then call [`run`](Self::run) on a
/// dedicated thread.
#[derive(Debug)]
pub struct Aggregator {
    receiver: SignalReceiver,
    writer: LogWriter,
}

impl Aggregator {
    pub const fn new(receiver: SignalReceiver, writer: LogWriter) -> Self {
        Self { receiver, writer }
    }

    /// Receives signals until both conduits are closed.
    ///
    /// - `Started(id)` marks the job running.
    /// - `Completed(id)` marks the job complete.
    /// - A failure marks the job failed.
    ///
    /// When one conduit closes it is swapped for a receiver that never fires,
    /// and the loop keeps draining the other until it closes too. Every value
    /// sent before closure is therefore applied, whatever order the conduits
    /// close in.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn run(self) -> AggregatorStats {
        let Self {
            receiver: SignalReceiver { status, errors },
            mut writer,
        } = self;

        let mut status = Some(status);
        let mut errors = Some(errors);
        let mut stats = AggregatorStats::default();

        while status.is_some() || errors.is_some() {
            let status_rx = status.clone().unwrap_or_else(never);
            let errors_rx = errors.clone().unwrap_or_else(never);

            select! {
                recv(status_rx) -> msg => match msg {
                    Ok(signal) => apply_signal(&mut writer, &mut stats, signal),
                    Err(_) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!("Status conduit closed");
                        status = None;
                    }
                },
                recv(errors_rx) -> msg => match msg {
                    Ok(Failure(id)) => {
                        #[cfg(feature = "tracing")]
                        tracing::trace!("Job {id} failed");
                        writer.record(id, JobState::Failed);
                        stats.failed += 1;
                    }
                    Err(_) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!("Error conduit closed");
                        errors = None;
                    }
                },
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            started = stats.started,
            completed = stats.completed,
            failed = stats.failed,
            "Aggregator drained"
        );

        stats
    }
}

fn apply_signal(writer: &mut LogWriter, stats: &mut AggregatorStats, signal: Signal) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Received {signal:?}");

    match signal {
        Signal::Started(id) => {
            writer.record(id, JobState::Running);
            stats.started += 1;
        }
        Signal::Completed(id) => {
            writer.record(id, JobState::Complete);
            stats.completed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{conduit, log::Log};
    use std::thread;

    #[test]
    fn applies_signals_and_stops_when_both_conduits_close() {
        let (tx, rx) = conduit::open();
        let (writer, reader) = Log::shared();
        let handle = thread::spawn(move || Aggregator::new(rx, writer).run());

        tx.started(1).unwrap();
        tx.started(2).unwrap();
        tx.completed(1).unwrap();
        tx.failed(2).unwrap();
        tx.started(3).unwrap();
        drop(tx);

        let stats = handle.join().unwrap();
        assert_eq!(
            stats,
            AggregatorStats {
                started: 3,
                completed: 1,
                failed: 1,
            }
        );

        let snapshot = reader.snapshot();
        assert_eq!(snapshot.running, vec![3]);
        assert_eq!(snapshot.complete, vec![1]);
        assert_eq!(snapshot.failed, vec![2]);
    }

    #[test]
    fn keeps_draining_after_error_conduit_closes() {
        let (status_tx, status_rx) = crossbeam_channel::bounded(0);
        // The error conduit's only sender is dropped right away, so it is
        // closed before any status arrives.
        let (_, errors_rx) = crossbeam_channel::bounded(0);
        let (writer, reader) = Log::shared();

        let aggregator = Aggregator::new(
            SignalReceiver {
                status: status_rx,
                errors: errors_rx,
            },
            writer,
        );
        let handle = thread::spawn(move || aggregator.run());

        status_tx.send(Signal::Started(8)).unwrap();
        status_tx.send(Signal::Completed(8)).unwrap();
        drop(status_tx);

        let stats = handle.join().unwrap();
        assert_eq!(stats.terminal(), 1);
        assert_eq!(reader.snapshot().complete, vec![8]);
    }

    #[test]
    fn keeps_draining_failures_after_status_conduit_closes() {
        let (status_tx, status_rx) = crossbeam_channel::bounded::<Signal>(0);
        let (errors_tx, errors_rx) = crossbeam_channel::bounded(0);
        let (writer, reader) = Log::shared();

        // The failure is already blocked in a send when the status conduit
        // closes.
        let producer = thread::spawn(move || errors_tx.send(Failure(9)));
        drop(status_tx);

        let aggregator = Aggregator::new(
            SignalReceiver {
                status: status_rx,
                errors: errors_rx,
            },
            writer,
        );
        let stats = thread::spawn(move || aggregator.run()).join().unwrap();

        assert!(producer.join().unwrap().is_ok());
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.started, 0);
        assert_eq!(reader.snapshot().failed, vec![9]);
        assert_eq!(reader.state(9), Some(JobState::Failed));
    }

    #[test]
    fn start_is_observed_before_terminal_signal() {
        let (tx, rx) = conduit::open();
        let (writer, reader) = Log::shared();
        let handle = thread::spawn(move || Aggregator::new(rx, writer).run());

        // Rendezvous sends return only after the aggregator took the value, so
        // the start is applied before the completion is even sent.
        tx.started(11).unwrap();
        tx.completed(11).unwrap();
        drop(tx);
        handle.join().unwrap();

        assert_eq!(reader.state(11), Some(JobState::Complete));
    }
}
