//! Command line runner around the `jobwatch` distributor.
//!
//! ## Structure
//!
//! - [`config`] - CLI arguments and their validated form.
//! - [`sink`] - Text and JSON report sinks.
//! - [`telemetry`] - Log subscriber setup.
//! - [`workload`] - Random job queue generation.

pub mod config;
pub mod sink;
pub mod telemetry;
pub mod workload;
