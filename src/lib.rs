//! Speedtest Core Library
//!
//! Estimates a host's download throughput by timing ranged transfers from a
//! list of public mirror files.
//!
//! # Architecture
//!
//! - [`throughput`] - probing, timed chunk downloads, and session aggregation
//!
//! The `speedtest` binary is a thin wrapper that renders progress lines and
//! the final average.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(test)]
pub mod test_support;
pub mod throughput;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use throughput::{
    DownloadMeasurement, ProbeResult, ProgressEvent, SessionError, SessionOutcome, SessionReport,
    SpeedTest, SpeedTestConfig, run_speed_test,
};
pub use user_agent::BROWSER_USER_AGENT;
