#![doc = include_str!("../README.md")]

mod aggregator;
pub mod conduit;
mod distributor;
mod error;
mod job;
mod log;
mod reporter;

pub use crate::aggregator::*;
pub use crate::conduit::{Failure, Signal, SignalReceiver, SignalSender};
pub use crate::distributor::*;
pub use crate::error::*;
pub use crate::job::*;
pub use crate::log::*;
pub use crate::reporter::*;
// Public re-export so callers can build a token without depending on
// `tokio-util` directly.
pub use tokio_util::sync::CancellationToken;
