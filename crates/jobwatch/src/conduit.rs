//! Signal transport between workers and the aggregator.
//!
//! Two rendezvous conduits are opened together: the status conduit carries
//! [`Signal`]s and the error conduit carries [`Failure`]s. Both are unbuffered,
//! so every send blocks until the single consumer takes the value. A conduit
//! closes when the last [`SignalSender`] clone is dropped; the consumer then
//! observes a disconnected receiver instead of a value.

use crate::{
    error::{Error, Result},
    job::JobId,
};
use crossbeam_channel::{Receiver, Sender};

/// A lifecycle transition carried on the status conduit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signal {
    /// The worker is about to execute the job.
    Started(JobId),
    /// The job executed successfully.
    Completed(JobId),
}

/// A failed job, carried on the error conduit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Failure(pub JobId);

/// Producer half of both conduits. One clone per worker.
#[derive(Clone, Debug)]
pub struct SignalSender {
    status: Sender<Signal>,
    errors: Sender<Failure>,
}

/// Consumer half of both conduits. There is exactly one, owned by the
/// aggregator.
#[derive(Debug)]
pub struct SignalReceiver {
    pub(crate) status: Receiver<Signal>,
    pub(crate) errors: Receiver<Failure>,
}

/// Opens the status and error conduits.
pub fn open() -> (SignalSender, SignalReceiver) {
    let (status_tx, status_rx) = crossbeam_channel::bounded(0);
    let (errors_tx, errors_rx) = crossbeam_channel::bounded(0);
    (
        SignalSender {
            status: status_tx,
            errors: errors_tx,
        },
        SignalReceiver {
            status: status_rx,
            errors: errors_rx,
        },
    )
}

impl SignalSender {
    /// Announces that job `id` is starting. Blocks until received.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the receiver has been dropped.
    pub fn started(&self, id: JobId) -> Result<()> {
        self.send_status(Signal::Started(id))
    }

    /// Announces that job `id` completed. Blocks until received.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the receiver has been dropped.
    pub fn completed(&self, id: JobId) -> Result<()> {
        self.send_status(Signal::Completed(id))
    }

    /// Announces that job `id` failed. Blocks until received.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the receiver has been dropped.
    pub fn failed(&self, id: JobId) -> Result<()> {
        self.errors
            .send(Failure(id))
            .map_err(|e| Error::ChannelClosed {
                context: format!("error conduit rejected failure of job {}", e.0.0),
            })
    }

    fn send_status(&self, signal: Signal) -> Result<()> {
        self.status.send(signal).map_err(|e| Error::ChannelClosed {
            context: format!("status conduit rejected {:?}", e.0),
        })
    }
}
