//! Session orchestration: probe every candidate, time a chunk from each viable
//! one, and average the results.
//!
//! Candidates are handled strictly one at a time in list order; no two
//! network operations overlap.
//!
//! # Example
//!
//! ```no_run
//! use speedtest_core::{SpeedTest, SpeedTestConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let session = SpeedTest::new(SpeedTestConfig::default())?.with_progress(tx);
//! let report = session.run().await;
//! while let Ok(line) = rx.try_recv() {
//!     println!("{line}");
//! }
//! println!("{:.2} Mbps", report.average_speed_mbps());
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::config::SpeedTestConfig;
use super::error::{MeasureError, SessionError};
use super::measure::{ChunkDownloader, DownloadMeasurement, ViableCandidate};
use super::probe::{AvailabilityProbe, ProbeResult};
use super::progress::ProgressEvent;
use super::transport::build_client;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// At least one download was measured.
    Measured,
    /// No candidate was reachable with range support.
    NoValidServer,
    /// Viable candidates existed but every download failed.
    AllTestsFailed,
    /// The session token was cancelled before all candidates were handled.
    Cancelled,
}

/// A viable candidate whose timed download failed.
#[derive(Debug)]
pub struct DownloadFailure {
    /// The candidate that failed.
    pub candidate: ViableCandidate,
    /// Why the download failed.
    pub error: MeasureError,
}

/// Everything observed during one session, in candidate order.
#[derive(Debug)]
pub struct SessionReport {
    probes: Vec<ProbeResult>,
    viable: Vec<ViableCandidate>,
    measurements: Vec<DownloadMeasurement>,
    failures: Vec<DownloadFailure>,
    average_speed_mbps: f64,
    outcome: SessionOutcome,
}

impl SessionReport {
    /// One probe result per candidate that was probed.
    #[must_use]
    pub fn probes(&self) -> &[ProbeResult] {
        &self.probes
    }

    /// Candidates that were available and range-capable.
    #[must_use]
    pub fn viable(&self) -> &[ViableCandidate] {
        &self.viable
    }

    /// Successful measurements.
    #[must_use]
    pub fn measurements(&self) -> &[DownloadMeasurement] {
        &self.measurements
    }

    /// Viable candidates whose download failed.
    #[must_use]
    pub fn failures(&self) -> &[DownloadFailure] {
        &self.failures
    }

    /// Mean of the successful measurements; 0 when there are none.
    #[must_use]
    pub fn average_speed_mbps(&self) -> f64 {
        self.average_speed_mbps
    }

    /// How the session ended.
    #[must_use]
    pub fn outcome(&self) -> SessionOutcome {
        self.outcome
    }

    /// Serializable view of the report for `--json` output.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            outcome: self.outcome,
            average_speed_mbps: self.average_speed_mbps,
            candidates_probed: self.probes.len(),
            viable: self.viable.len(),
            measurements: self.measurements.clone(),
            failures: self
                .failures
                .iter()
                .map(|failure| FailureSummary {
                    file_name: failure.candidate.file_name().to_string(),
                    url: failure.candidate.url().to_string(),
                    error: failure.error.to_string(),
                })
                .collect(),
        }
    }
}

/// Serializable session summary.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub outcome: SessionOutcome,
    pub average_speed_mbps: f64,
    pub candidates_probed: usize,
    pub viable: usize,
    pub measurements: Vec<DownloadMeasurement>,
    pub failures: Vec<FailureSummary>,
}

/// Serializable download failure.
#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub file_name: String,
    pub url: String,
    pub error: String,
}

/// Arithmetic mean of `speeds`; 0 for an empty input.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_speed<I>(speeds: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = speeds
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), speed| (sum + speed, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// A configured throughput session.
///
/// Holds one HTTP client shared by the probe and downloader, an optional
/// progress channel, and the session cancellation token. Each network
/// operation runs under its own child token.
#[derive(Debug)]
pub struct SpeedTest {
    config: SpeedTestConfig,
    probe: AvailabilityProbe,
    downloader: ChunkDownloader,
    progress: Option<UnboundedSender<ProgressEvent>>,
    cancel: CancellationToken,
}

impl SpeedTest {
    /// Validates `config` and builds the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the configuration is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(config: SpeedTestConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let client =
            build_client(config.user_agent(), config.timeout()).map_err(SessionError::Client)?;
        Ok(Self {
            probe: AvailabilityProbe::new(client.clone(), &config),
            downloader: ChunkDownloader::new(client, &config),
            config,
            progress: None,
            cancel: CancellationToken::new(),
        })
    }

    /// Sends progress lines to `sender` while the session runs.
    #[must_use]
    pub fn with_progress(mut self, sender: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Token that aborts the session; cancelling it fails the in-flight
    /// operation and skips the remaining candidates.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the full session. Per-candidate failures are recorded in the
    /// report; the session itself always completes.
    #[instrument(skip(self), fields(candidates = self.config.candidate_urls().len()))]
    pub async fn run(&self) -> SessionReport {
        let candidates = self.config.candidate_urls();
        self.emit(ProgressEvent::ValidatingCandidates {
            count: candidates.len(),
        });

        let mut probes = Vec::with_capacity(candidates.len());
        let mut viable = Vec::new();
        for url in candidates {
            if self.cancel.is_cancelled() {
                break;
            }
            let result = self.probe.probe(url, &self.cancel.child_token()).await;
            match ViableCandidate::from_probe(&result) {
                Some(candidate) => {
                    debug!(url = %url, final_url = %candidate.url(), "candidate accepted");
                    viable.push(candidate);
                }
                None => debug!(
                    url = %url,
                    available = result.available(),
                    supports_range = result.supports_range(),
                    error = ?result.error().map(ToString::to_string),
                    "candidate dropped"
                ),
            }
            probes.push(result);
        }

        if viable.is_empty() {
            let outcome = if self.cancel.is_cancelled() {
                self.emit(ProgressEvent::Cancelled);
                SessionOutcome::Cancelled
            } else {
                info!("no valid server found");
                self.emit(ProgressEvent::NoValidServer);
                SessionOutcome::NoValidServer
            };
            return SessionReport {
                probes,
                viable,
                measurements: Vec::new(),
                failures: Vec::new(),
                average_speed_mbps: 0.0,
                outcome,
            };
        }

        self.emit(ProgressEvent::TestingSpeeds {
            viable: viable.len(),
        });

        let mut measurements = Vec::new();
        let mut failures = Vec::new();
        for candidate in &viable {
            if self.cancel.is_cancelled() {
                break;
            }
            match self
                .downloader
                .download(candidate, &self.cancel.child_token())
                .await
            {
                Ok(measurement) => {
                    self.emit(ProgressEvent::FileMeasured {
                        file_name: measurement.file_name().to_string(),
                        speed_mbps: measurement.speed_mbps(),
                    });
                    measurements.push(measurement);
                }
                Err(error) => {
                    warn!(url = %candidate.url(), error = %error, "download test failed");
                    failures.push(DownloadFailure {
                        candidate: candidate.clone(),
                        error,
                    });
                }
            }
        }

        let average_speed_mbps =
            average_speed(measurements.iter().map(DownloadMeasurement::speed_mbps));
        let outcome = if self.cancel.is_cancelled() {
            SessionOutcome::Cancelled
        } else if measurements.is_empty() {
            SessionOutcome::AllTestsFailed
        } else {
            SessionOutcome::Measured
        };

        if !measurements.is_empty() {
            self.emit(ProgressEvent::Average {
                average_mbps: average_speed_mbps,
                servers: measurements.len(),
            });
        }
        match outcome {
            SessionOutcome::Cancelled => self.emit(ProgressEvent::Cancelled),
            SessionOutcome::AllTestsFailed => self.emit(ProgressEvent::AllTestsFailed),
            SessionOutcome::Measured | SessionOutcome::NoValidServer => {}
        }

        info!(
            average_speed_mbps,
            measured = measurements.len(),
            failed = failures.len(),
            ?outcome,
            "speed test complete"
        );

        SessionReport {
            probes,
            viable,
            measurements,
            failures,
            average_speed_mbps,
            outcome,
        }
    }

    fn emit(&self, event: ProgressEvent) {
        debug!(%event, "progress");
        if let Some(sender) = &self.progress {
            // A dropped receiver only means nobody is rendering progress.
            let _ = sender.send(event);
        }
    }
}

/// Runs a session with `config` and returns the average throughput in Mbps
/// (0 when nothing could be measured).
///
/// # Errors
///
/// Returns [`SessionError`] only when the session cannot start; network
/// failures never surface here.
pub async fn run_speed_test(config: SpeedTestConfig) -> Result<f64, SessionError> {
    let session = SpeedTest::new(config)?;
    Ok(session.run().await.average_speed_mbps())
}
