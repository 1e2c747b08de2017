//! Download throughput measurement.
//!
//! A session probes each candidate URL with `HEAD`, keeps the ones that are
//! reachable and serve byte ranges, downloads a bounded window from each,
//! and averages the achieved throughput.
//!
//! # Features
//!
//! - Redirects followed manually, bounded at 3 per candidate
//! - Range support detected from `Accept-Ranges` or `Content-Length`
//! - Transfers aborted once the 10 MiB window is full
//! - Per-request timeout and cancellation token on every network step
//! - Throughput in decimal megabits per second
//!
//! # Example
//!
//! ```no_run
//! use speedtest_core::throughput::{SpeedTestConfig, run_speed_test};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mbps = run_speed_test(SpeedTestConfig::default()).await?;
//! println!("{mbps:.2} Mbps");
//! # Ok(())
//! # }
//! ```

mod config;
pub mod constants;
mod error;
pub mod filename;
mod measure;
mod probe;
mod progress;
mod session;
mod transport;

pub use config::SpeedTestConfig;
pub use constants::{CHUNK_SIZE, DEFAULT_CANDIDATE_URLS, MAX_REDIRECTS, TIMEOUT};
pub use error::{MeasureError, ProbeError, SessionError};
pub use filename::extract_file_name;
pub use measure::{ChunkDownloader, DownloadMeasurement, ViableCandidate, throughput_mbps};
pub use probe::{AvailabilityProbe, ProbeResult, range_capable};
pub use progress::ProgressEvent;
pub use session::{
    DownloadFailure, FailureSummary, SessionOutcome, SessionReport, SessionSummary, SpeedTest,
    average_speed, run_speed_test,
};
pub use transport::{TransportScheme, parse_target};
