//! The lifecycle log and its snapshots.
//!
//! The log maps each job id to its latest [`JobState`]. It is created with
//! [`Log::shared`], which hands out exactly one [`LogWriter`] and a cloneable
//! [`LogReader`]. The writer is not `Clone`, so the single-writer rule is
//! enforced by ownership: whoever holds the writer (the aggregator) is the
//! only party that can mutate the log.

use crate::job::JobId;
use core::fmt;
use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};

/// Lifecycle state of a job as last reported on the conduits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum JobState {
    Running,
    Complete,
    Failed,
}

/// Mapping from job id to lifecycle state, ordered by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Log {
    entries: BTreeMap<JobId, JobState>,
}

impl Log {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty log behind a lock and returns its single writer
    /// together with a reader.
    pub fn shared() -> (LogWriter, LogReader) {
        let inner = Arc::new(RwLock::new(Self::new()));
        (
            LogWriter {
                inner: Arc::clone(&inner),
            },
            LogReader { inner },
        )
    }

    /// Records `state` for `id`, overwriting any previous state.
    pub fn record(&mut self, id: JobId, state: JobState) {
        self.entries.insert(id, state);
    }

    pub fn get(&self, id: JobId) -> Option<JobState> {
        self.entries.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = (JobId, JobState)> + '_ {
        self.entries.iter().map(|(&id, &state)| (id, state))
    }

    /// Partitions the entries by state. Each list is in ascending id order.
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for (id, state) in self.iter() {
            match state {
                JobState::Running => snapshot.running.push(id),
                JobState::Complete => snapshot.complete.push(id),
                JobState::Failed => snapshot.failed.push(id),
            }
        }
        snapshot
    }
}

impl FromIterator<(JobId, JobState)> for Log {
    fn from_iter<I: IntoIterator<Item = (JobId, JobState)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Exclusive write access to a shared [`Log`].
#[derive(Debug)]
pub struct LogWriter {
    inner: Arc<RwLock<Log>>,
}

impl LogWriter {
    /// Records `state` for `id`. Holds the write lock only for the insert.
    pub fn record(&mut self, id: JobId, state: JobState) {
        self.inner.write().record(id, state);
    }

    /// Returns a new reader over the same log.
    pub fn reader(&self) -> LogReader {
        LogReader {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Read-only access to a shared [`Log`].
#[derive(Clone, Debug)]
pub struct LogReader {
    inner: Arc<RwLock<Log>>,
}

impl LogReader {
    /// Takes a best-effort snapshot. Signals that arrive while the snapshot is
    /// being taken may or may not be reflected.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.read().snapshot()
    }

    pub fn state(&self, id: JobId) -> Option<JobState> {
        self.inner.read().get(id)
    }
}

/// Job ids partitioned by state, each list ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub running: Vec<JobId>,
    pub complete: Vec<JobId>,
    pub failed: Vec<JobId>,
}

impl Snapshot {
    /// Total number of jobs across all states.
    pub fn len(&self) -> usize {
        self.running.len() + self.complete.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct IdList<'a>(&'a [JobId]);

impl fmt::Display for IdList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{id}")?;
        }
        f.write_str("]")
    }
}

/// Console report block: a separator followed by one line per state.
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--------------------------------------")?;
        writeln!(f, "Running:  {}", IdList(&self.running))?;
        writeln!(f, "Complete:  {}", IdList(&self.complete))?;
        writeln!(f, "Failed:  {}", IdList(&self.failed))
    }
}
