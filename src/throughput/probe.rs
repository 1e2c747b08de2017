//! Capability checks: is a candidate reachable, and will it serve byte ranges?
//!
//! The probe issues `HEAD` requests and follows redirects itself so the
//! redirect chain can be bounded. Every failure is folded into the returned
//! [`ProbeResult`]; nothing is raised past [`AvailabilityProbe::probe`].

use std::time::Duration;

use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, HeaderMap, LOCATION};
use reqwest::{Client, Response};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use super::config::SpeedTestConfig;
use super::constants::REDIRECT_STATUSES;
use super::error::ProbeError;
use super::transport::{TransportScheme, bounded, parse_target};

/// Outcome of probing one candidate URL.
#[derive(Debug)]
pub struct ProbeResult {
    available: bool,
    supports_range: bool,
    final_url: String,
    scheme: Option<TransportScheme>,
    redirects: u32,
    error: Option<ProbeError>,
}

impl ProbeResult {
    fn answered(url: &Url, scheme: TransportScheme, redirects: u32, response: &Response) -> Self {
        let status = response.status().as_u16();
        let available = (200..400).contains(&status);
        Self {
            available,
            supports_range: available && range_capable(response.headers()),
            final_url: url.to_string(),
            scheme: Some(scheme),
            redirects,
            error: None,
        }
    }

    fn failed(
        url: impl Into<String>,
        scheme: Option<TransportScheme>,
        redirects: u32,
        error: ProbeError,
    ) -> Self {
        Self {
            available: false,
            supports_range: false,
            final_url: url.into(),
            scheme,
            redirects,
            error: Some(error),
        }
    }

    /// Whether the final response status was in `200..400`.
    #[must_use]
    pub fn available(&self) -> bool {
        self.available
    }

    /// Whether the server advertised byte ranges or a content length.
    #[must_use]
    pub fn supports_range(&self) -> bool {
        self.supports_range
    }

    /// Whether the candidate can be measured.
    #[must_use]
    pub fn is_viable(&self) -> bool {
        self.available && self.supports_range
    }

    /// URL after redirect resolution (the last URL attempted on failure).
    #[must_use]
    pub fn final_url(&self) -> &str {
        &self.final_url
    }

    /// Transport of the final URL; `None` when the URL could not be parsed.
    #[must_use]
    pub fn scheme(&self) -> Option<TransportScheme> {
        self.scheme
    }

    /// Number of redirects followed; never more than the configured bound.
    #[must_use]
    pub fn redirects(&self) -> u32 {
        self.redirects
    }

    /// Why the probe failed, if it did.
    #[must_use]
    pub fn error(&self) -> Option<&ProbeError> {
        self.error.as_ref()
    }
}

/// Range support heuristic: an explicit `Accept-Ranges: bytes`, or any
/// `Content-Length` (some mirrors omit `Accept-Ranges` but honor ranges).
#[must_use]
pub fn range_capable(headers: &HeaderMap) -> bool {
    let accepts_bytes = headers
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("bytes"));
    accepts_bytes || headers.contains_key(CONTENT_LENGTH)
}

/// Issues capability checks against candidate URLs.
#[derive(Debug, Clone)]
pub struct AvailabilityProbe {
    client: Client,
    timeout: Duration,
    max_redirects: u32,
}

impl AvailabilityProbe {
    /// Creates a probe sharing `client`, with limits taken from `config`.
    #[must_use]
    pub fn new(client: Client, config: &SpeedTestConfig) -> Self {
        Self {
            client,
            timeout: config.timeout(),
            max_redirects: config.max_redirects(),
        }
    }

    /// Probes `url`, following at most `max_redirects` redirects.
    ///
    /// Each `HEAD` request is bounded by the configured timeout and aborted
    /// when `cancel` fires.
    #[instrument(skip(self, cancel), fields(url = %url))]
    pub async fn probe(&self, url: &str, cancel: &CancellationToken) -> ProbeResult {
        let Some((mut current, mut scheme)) = parse_target(url) else {
            debug!("rejecting malformed candidate URL");
            return ProbeResult::failed(url, None, 0, ProbeError::invalid_url(url));
        };
        let mut redirects = 0;

        loop {
            let response = match self.head(&current, cancel).await {
                Ok(response) => response,
                Err(error) => {
                    debug!(error = %error, "capability check failed");
                    return ProbeResult::failed(current.as_str(), Some(scheme), redirects, error);
                }
            };

            let status = response.status().as_u16();
            if REDIRECT_STATUSES.contains(&status)
                && let Some(location) = response.headers().get(LOCATION)
            {
                if redirects == self.max_redirects {
                    debug!(status, from = %current, redirects, "redirect limit reached");
                    let error = ProbeError::too_many_redirects(url, self.max_redirects);
                    return ProbeResult::failed(current.as_str(), Some(scheme), redirects, error);
                }
                let raw = String::from_utf8_lossy(location.as_bytes()).into_owned();
                let Some((next, next_scheme)) = current
                    .join(&raw)
                    .ok()
                    .and_then(|joined| parse_target(joined.as_str()))
                else {
                    let error = ProbeError::invalid_location(current.as_str(), raw);
                    return ProbeResult::failed(current.as_str(), Some(scheme), redirects, error);
                };
                redirects += 1;
                debug!(status, from = %current, to = %next, redirects, "following redirect");
                current = next;
                scheme = next_scheme;
                continue;
            }

            let result = ProbeResult::answered(&current, scheme, redirects, &response);
            debug!(
                status,
                available = result.available(),
                supports_range = result.supports_range(),
                "capability check complete"
            );
            return result;
        }
    }

    async fn head(&self, url: &Url, cancel: &CancellationToken) -> Result<Response, ProbeError> {
        let request = self.client.head(url.clone()).send();
        bounded(url.as_str(), self.timeout, cancel, request).await
    }
}
