//! Error types for the job distribution layer.
//!
//! ## Error Cases
//! - `AlreadyExecuted`: A job was executed after it had already completed. This
//!   is the only job-level failure and is absorbed into the log as `Failed`.
//! - `ChannelClosed`: A signal could not be delivered because the aggregator
//!   stopped receiving.
//! - `InvalidConfig`: The distributor was configured with unusable values.
//! - `Spawn`: The OS refused to start a thread.
//! - `ThreadPanicked`: A worker, aggregator or reporter thread panicked.

use crate::job::JobId;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `jobwatch` can emit.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The job's completion flag was already set when `execute` was called.
    #[error("Job {id} already executed")]
    AlreadyExecuted { id: JobId },

    /// A conduit send failed because the receiving side is gone.
    #[error("Channel closed: {context}")]
    ChannelClosed { context: String },

    /// The distributor configuration cannot be used for a run.
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// A thread could not be spawned.
    #[error("Failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// A thread terminated by panicking instead of returning.
    #[error("Thread '{name}' panicked")]
    ThreadPanicked { name: String },
}

impl Error {
    /// Returns `true` for job-level failures that are recorded in the log
    /// rather than aborting a run.
    pub const fn is_job_failure(&self) -> bool {
        matches!(self, Self::AlreadyExecuted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_already_executed_is_a_job_failure() {
        assert!(Error::AlreadyExecuted { id: 3 }.is_job_failure());
        assert!(
            !Error::ChannelClosed {
                context: "status".into()
            }
            .is_job_failure()
        );
        assert!(
            !Error::InvalidConfig {
                reason: "zero threads".into()
            }
            .is_job_failure()
        );
    }

    #[test]
    fn display_includes_context() {
        let err = Error::AlreadyExecuted { id: 7 };
        assert_eq!(err.to_string(), "Job 7 already executed");

        let err = Error::ThreadPanicked {
            name: "jobwatch-worker-2".into(),
        };
        assert_eq!(err.to_string(), "Thread 'jobwatch-worker-2' panicked");
    }
}
