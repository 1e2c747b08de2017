//! Timed ranged downloads.
//!
//! A [`ChunkDownloader`] requests the first `chunk_size` bytes of a viable
//! candidate, counts body bytes as they arrive, and drops the response the
//! moment the window is full. Dropping the response closes the connection, so
//! a large file never transfers more than one window.

use std::time::{Duration, Instant};

use futures_util::{FutureExt, StreamExt};
use reqwest::Client;
use reqwest::header::RANGE;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use url::Url;

use super::config::SpeedTestConfig;
use super::constants::BITS_PER_MEGABIT;
use super::error::MeasureError;
use super::filename::extract_file_name;
use super::probe::ProbeResult;
use super::transport::{TransportScheme, bounded, parse_target};

/// A probed candidate that is reachable and serves byte ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViableCandidate {
    url: Url,
    scheme: TransportScheme,
    file_name: String,
}

impl ViableCandidate {
    /// Builds a candidate from a probe result; `None` unless the probe found
    /// the URL available and range-capable.
    #[must_use]
    pub fn from_probe(result: &ProbeResult) -> Option<Self> {
        if !result.is_viable() {
            return None;
        }
        let (url, scheme) = parse_target(result.final_url())?;
        Some(Self::new(url, scheme))
    }

    /// Creates a candidate for `url`, deriving its display name.
    #[must_use]
    pub fn new(url: Url, scheme: TransportScheme) -> Self {
        let file_name = extract_file_name(&url);
        Self {
            url,
            scheme,
            file_name,
        }
    }

    /// Redirect-resolved URL to download from.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Transport carrying the download.
    #[must_use]
    pub fn scheme(&self) -> TransportScheme {
        self.scheme
    }

    /// Display name (last path segment).
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Throughput achieved for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadMeasurement {
    file_name: String,
    bytes_downloaded: u64,
    duration_secs: f64,
    speed_mbps: f64,
}

impl DownloadMeasurement {
    /// Creates a measurement, deriving speed from bytes and elapsed time.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes_downloaded: u64, elapsed: Duration) -> Self {
        let duration_secs = elapsed.as_secs_f64();
        Self {
            file_name: file_name.into(),
            bytes_downloaded,
            duration_secs,
            speed_mbps: throughput_mbps(bytes_downloaded, duration_secs),
        }
    }

    /// Display name of the measured file.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Body bytes counted, never more than the chunk size.
    #[must_use]
    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded
    }

    /// Wall-clock seconds from sending the request to the end of the transfer.
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Throughput in decimal megabits per second.
    #[must_use]
    pub fn speed_mbps(&self) -> f64 {
        self.speed_mbps
    }
}

/// Converts bytes over seconds into decimal megabits per second.
///
/// Returns 0 for a zero (or negative) duration.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn throughput_mbps(bytes: u64, duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0) / (duration_secs * BITS_PER_MEGABIT)
}

/// Downloads and times a bounded window from each candidate.
#[derive(Debug, Clone)]
pub struct ChunkDownloader {
    client: Client,
    timeout: Duration,
    chunk_size: u64,
    range_header: String,
}

impl ChunkDownloader {
    /// Creates a downloader sharing `client`, with limits taken from `config`.
    #[must_use]
    pub fn new(client: Client, config: &SpeedTestConfig) -> Self {
        Self {
            client,
            timeout: config.timeout(),
            chunk_size: config.chunk_size(),
            range_header: config.range_header(),
        }
    }

    /// Downloads up to `chunk_size` bytes from `candidate` and reports the
    /// achieved throughput.
    ///
    /// The timeout applies to the response headers and to every body read
    /// separately, so a transfer that stalls mid-stream fails once no byte has
    /// arrived for a full timeout period.
    ///
    /// # Errors
    ///
    /// Returns `MeasureError` if:
    /// - The request or a body read fails (network error)
    /// - No response or body bytes arrive within the timeout
    /// - `cancel` fires
    /// - The server answers with a status other than 200 or 206
    #[instrument(skip(self, candidate, cancel), fields(url = %candidate.url()))]
    pub async fn download(
        &self,
        candidate: &ViableCandidate,
        cancel: &CancellationToken,
    ) -> Result<DownloadMeasurement, MeasureError> {
        let url = candidate.url().as_str();
        let request = self
            .client
            .get(candidate.url().clone())
            .header(RANGE, self.range_header.as_str());

        let started = Instant::now();
        let response =
            bounded::<MeasureError, _, _>(url, self.timeout, cancel, request.send()).await?;

        let status = response.status().as_u16();
        if status != 200 && status != 206 {
            return Err(MeasureError::invalid_status(url, status));
        }
        debug!(status, "ranged download started");

        let mut stream = response.bytes_stream();
        let mut bytes_downloaded: u64 = 0;
        let mut aborted = false;

        while let Some(chunk) = bounded::<MeasureError, _, _>(
            url,
            self.timeout,
            cancel,
            stream.next().map(Option::transpose),
        )
        .await?
        {
            let remaining = self.chunk_size - bytes_downloaded;
            bytes_downloaded += (chunk.len() as u64).min(remaining);
            if bytes_downloaded >= self.chunk_size {
                aborted = true;
                break;
            }
        }
        drop(stream);
        let elapsed = started.elapsed();

        let measurement = DownloadMeasurement::new(candidate.file_name(), bytes_downloaded, elapsed);
        info!(
            file = %measurement.file_name(),
            bytes = measurement.bytes_downloaded(),
            secs = measurement.duration_secs(),
            speed_mbps = measurement.speed_mbps(),
            aborted,
            "chunk measured"
        );
        Ok(measurement)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use crate::throughput::transport::build_client;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn downloader(chunk_size: u64, timeout: Duration) -> ChunkDownloader {
        let config = SpeedTestConfig::new()
            .with_chunk_size(chunk_size)
            .with_timeout(timeout);
        let client = build_client(config.user_agent(), config.timeout()).unwrap();
        ChunkDownloader::new(client, &config)
    }

    fn candidate(url: &str) -> ViableCandidate {
        let (url, scheme) = parse_target(url).unwrap();
        ViableCandidate::new(url, scheme)
    }

    #[test]
    fn test_throughput_gigabit() {
        assert!((throughput_mbps(125_000_000, 1.0) - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_throughput_zero_duration_is_zero() {
        assert_eq!(throughput_mbps(125_000_000, 0.0), 0.0);
        assert_eq!(throughput_mbps(0, 0.0), 0.0);
    }

    #[test]
    fn test_throughput_is_decimal_megabits() {
        // 10 MiB in 1 s is 83.886 Mbps, not 80 Mibps.
        let speed = throughput_mbps(10 * 1024 * 1024, 1.0);
        assert!((speed - 83.886_08).abs() < 1e-9, "got {speed}");
    }

    #[test]
    fn test_measurement_zero_elapsed() {
        let measurement = DownloadMeasurement::new("a.iso", 4096, Duration::ZERO);
        assert_eq!(measurement.speed_mbps(), 0.0);
        assert_eq!(measurement.duration_secs(), 0.0);
    }

    #[test]
    fn test_viable_candidate_takes_name_from_final_url() {
        let candidate = candidate("https://mirror.example/isos/debian.iso");
        assert_eq!(candidate.file_name(), "debian.iso");
        assert_eq!(candidate.scheme(), TransportScheme::Https);
    }

    #[tokio::test]
    async fn test_download_partial_content() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/file.iso"))
            .and(header("Range", "bytes=0-1023"))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(vec![7u8; 1024]))
            .expect(1)
            .mount(&server)
            .await;

        let candidate = candidate(&format!("{}/file.iso", server.uri()));
        let measurement = downloader(1024, Duration::from_secs(5))
            .download(&candidate, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(measurement.file_name(), "file.iso");
        assert_eq!(measurement.bytes_downloaded(), 1024);
        assert!(measurement.speed_mbps() >= 0.0);
        assert!(measurement.duration_secs() >= 0.0);
    }

    #[tokio::test]
    async fn test_download_full_body_is_capped_at_chunk_size() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        // Server ignores Range and sends the whole file.
        Mock::given(method("GET"))
            .and(path("/big.iso"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 256 * 1024]))
            .mount(&server)
            .await;

        let candidate = candidate(&format!("{}/big.iso", server.uri()));
        let measurement = downloader(4096, Duration::from_secs(5))
            .download(&candidate, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(measurement.bytes_downloaded(), 4096);
    }

    #[tokio::test]
    async fn test_download_short_body_counts_what_arrived() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/tiny.iso"))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(b"0123456789".to_vec()))
            .mount(&server)
            .await;

        let candidate = candidate(&format!("{}/tiny.iso", server.uri()));
        let measurement = downloader(4096, Duration::from_secs(5))
            .download(&candidate, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(measurement.bytes_downloaded(), 10);
    }

    #[tokio::test]
    async fn test_download_rejects_unexpected_status() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/range.iso"))
            .respond_with(ResponseTemplate::new(416))
            .mount(&server)
            .await;

        let candidate = candidate(&format!("{}/range.iso", server.uri()));
        let result = downloader(1024, Duration::from_secs(5))
            .download(&candidate, &CancellationToken::new())
            .await;

        match result {
            Err(MeasureError::InvalidStatus { status, .. }) => assert_eq!(status, 416),
            other => panic!("expected InvalidStatus, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_download_timeout_waiting_for_response() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/slow.iso"))
            .respond_with(
                ResponseTemplate::new(206)
                    .set_body_bytes(vec![0u8; 16])
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let candidate = candidate(&format!("{}/slow.iso", server.uri()));
        let result = downloader(1024, Duration::from_millis(150))
            .download(&candidate, &CancellationToken::new())
            .await;

        assert!(
            result.as_ref().is_err_and(MeasureError::is_timeout),
            "expected timeout, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn test_download_cancelled() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/file.iso"))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(vec![0u8; 16]))
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let candidate = candidate(&format!("{}/file.iso", server.uri()));
        let result = downloader(1024, Duration::from_secs(5))
            .download(&candidate, &cancel)
            .await;

        assert!(matches!(result, Err(MeasureError::Cancelled { .. })));
    }
}
