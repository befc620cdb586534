//! Periodic rendering of the lifecycle log.
//!
//! The [`Reporter`] runs on its own thread, independent of the aggregator. As
//! soon as it starts, and then on every tick, it takes a snapshot through a [`LogReader`] and passes it to a
//! [`ReportSink`]. Snapshots are best-effort: they may miss signals that are
//! being applied concurrently, but they never hold the log lock for longer
//! than a copy.
//!
//! A reporter stops when its [`ReporterHandle`] is stopped or dropped. It then
//! emits one final report so the settled state of a run is always rendered.

use crate::{
    error::{Error, Result},
    log::{LogReader, Snapshot},
};
use core::time::Duration;
use crossbeam_channel::{Receiver, Sender, select, tick};
use std::{
    io::Write,
    thread::{self, Scope, ScopedJoinHandle},
};

/// Destination for rendered snapshots.
pub trait ReportSink: Send {
    fn report(&mut self, snapshot: &Snapshot);
}

impl<F> ReportSink for F
where
    F: FnMut(&Snapshot) + Send,
{
    fn report(&mut self, snapshot: &Snapshot) {
        self(snapshot);
    }
}

/// Writes each snapshot in the console block format to `W`.
#[derive(Debug)]
pub struct ConsoleSink<W> {
    out: W,
}

impl<W: Write> ConsoleSink<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ReportSink for ConsoleSink<W> {
    fn report(&mut self, snapshot: &Snapshot) {
        let res = write!(self.out, "{snapshot}").and_then(|()| self.out.flush());
        if let Err(_e) = res {
            #[cfg(feature = "tracing")]
            tracing::warn!("Failed to write report: {_e}");
        }
    }
}

/// Polls a log on a fixed interval and hands snapshots to a sink.
pub struct Reporter<S> {
    reader: LogReader,
    interval: Duration,
    sink: S,
}

impl<S: ReportSink> Reporter<S> {
    pub const fn new(reader: LogReader, interval: Duration, sink: S) -> Self {
        Self {
            reader,
            interval,
            sink,
        }
    }

    /// Reports every `interval` until `shutdown` receives a value or is
    /// disconnected, then reports once more and returns the sink.
    ///
    /// The first report is emitted right away, before the first tick.
    pub fn run(mut self, shutdown: &Receiver<()>) -> S {
        let ticker = tick(self.interval);
        self.sink.report(&self.reader.snapshot());

        loop {
            select! {
                recv(ticker) -> _ => self.sink.report(&self.reader.snapshot()),
                recv(shutdown) -> _ => break,
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Reporter stopping, emitting final report");
        self.sink.report(&self.reader.snapshot());
        self.sink
    }

    /// Starts the reporter on a named thread inside `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the thread could not be started.
    pub fn spawn_scoped<'scope, 'env>(
        self,
        scope: &'scope Scope<'scope, 'env>,
    ) -> Result<ReporterHandle<'scope, S>>
    where
        S: 'scope,
    {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(0);
        let handle = thread::Builder::new()
            .name(REPORTER_THREAD.into())
            .spawn_scoped(scope, move || self.run(&shutdown_rx))?;

        Ok(ReporterHandle {
            shutdown: shutdown_tx,
            handle,
        })
    }
}

const REPORTER_THREAD: &str = "jobwatch-reporter";

/// Stop signal and join handle of a running [`Reporter`].
pub struct ReporterHandle<'scope, S> {
    shutdown: Sender<()>,
    handle: ScopedJoinHandle<'scope, S>,
}

impl<S> ReporterHandle<'_, S> {
    /// Wakes the reporter, waits for its final report and returns the sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadPanicked`] if the sink panicked.
    pub fn stop(self) -> Result<S> {
        let Self { shutdown, handle } = self;
        // Disconnecting is enough to wake the select.
        drop(shutdown);
        handle.join().map_err(|_| Error::ThreadPanicked {
            name: REPORTER_THREAD.into(),
        })
    }
}
