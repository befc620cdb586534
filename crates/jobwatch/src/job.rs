use crate::error::{Error, Result};
use core::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Caller-assigned job identity, unique within a run.
pub type JobId = u64;

/// A unit of work the distributor can hand to a worker.
///
/// Implementors are owned by exactly one worker for the duration of a run, so
/// `execute` takes `&mut self` and no synchronization is required.
pub trait Execute {
    /// Returns the identity reported in lifecycle signals.
    fn id(&self) -> JobId;

    /// Performs the work.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExecuted`] if the job has already run to
    /// completion. No other failure is defined.
    fn execute(&mut self) -> Result<()>;
}

/// A simulated job whose work is a blocking delay of `workload`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    id: JobId,
    workload: Duration,
    done: bool,
}

impl Job {
    /// Creates a job that has not run yet.
    pub const fn new(id: JobId, workload: Duration) -> Self {
        Self {
            id,
            workload,
            done: false,
        }
    }

    /// Returns the simulated duration of the work.
    pub const fn workload(&self) -> Duration {
        self.workload
    }

    /// Returns `true` once the job has executed successfully.
    pub const fn is_done(&self) -> bool {
        self.done
    }
}

impl Execute for Job {
    fn id(&self) -> JobId {
        self.id
    }

    /// Sleeps for the job's workload and marks it done.
    ///
    /// Calling this on a job that is already done has no side effects and
    /// returns [`Error::AlreadyExecuted`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(id = self.id)))]
    fn execute(&mut self) -> Result<()> {
        if self.done {
            return Err(Error::AlreadyExecuted { id: self.id });
        }

        if !self.workload.is_zero() {
            std::thread::sleep(self.workload);
        }

        self.done = true;
        Ok(())
    }
}
