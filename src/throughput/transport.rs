//! HTTP transport shared by the probe and the chunk downloader.
//!
//! The scheme of each request is resolved once, up front, into a
//! [`TransportScheme`]; anything other than `http`/`https` is rejected before
//! a connection is attempted. Automatic redirect following is disabled so the
//! probe can count and bound redirects itself.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::{Client, redirect};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::error::{MeasureError, ProbeError};

/// Transport used to reach a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportScheme {
    /// Plain-text HTTP.
    Http,
    /// HTTP over TLS.
    Https,
}

impl TransportScheme {
    /// Selects the transport for `url`, or `None` for unsupported schemes.
    #[must_use]
    pub fn for_url(url: &Url) -> Option<Self> {
        match url.scheme() {
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            _ => None,
        }
    }
}

impl fmt::Display for TransportScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Https => f.write_str("https"),
        }
    }
}

/// Parses `raw` into a URL plus the transport that will carry it.
///
/// Returns `None` when `raw` is malformed, has no host, or uses a scheme the
/// transport cannot serve.
#[must_use]
pub fn parse_target(raw: &str) -> Option<(Url, TransportScheme)> {
    let url = Url::parse(raw).ok()?;
    url.host_str()?;
    let scheme = TransportScheme::for_url(&url)?;
    Some((url, scheme))
}

/// Builds the client used for every request in a session.
///
/// `timeout` bounds connection establishment; the probe and downloader apply
/// the same value to each response and body read themselves.
pub(crate) fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(timeout)
        .redirect(redirect::Policy::none())
        .user_agent(user_agent)
        .build()
}

/// Errors a bounded request step can fail with.
pub(crate) trait StepError {
    fn cancelled(url: &str) -> Self;
    fn timed_out(url: &str, timeout: Duration) -> Self;
    fn network(url: &str, source: reqwest::Error) -> Self;
}

impl StepError for ProbeError {
    fn cancelled(url: &str) -> Self {
        ProbeError::cancelled(url)
    }

    fn timed_out(url: &str, timeout: Duration) -> Self {
        ProbeError::timeout(url, timeout)
    }

    fn network(url: &str, source: reqwest::Error) -> Self {
        ProbeError::network(url, source)
    }
}

impl StepError for MeasureError {
    fn cancelled(url: &str) -> Self {
        MeasureError::cancelled(url)
    }

    fn timed_out(url: &str, timeout: Duration) -> Self {
        MeasureError::timeout(url, timeout)
    }

    fn network(url: &str, source: reqwest::Error) -> Self {
        MeasureError::network(url, source)
    }
}

/// Runs one request step (send, or a single body read) under `timeout` and
/// `cancel`. Cancellation wins when both are ready.
pub(crate) async fn bounded<E, F, T>(
    url: &str,
    timeout: Duration,
    cancel: &CancellationToken,
    step: F,
) -> Result<T, E>
where
    E: StepError,
    F: Future<Output = Result<T, reqwest::Error>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(E::cancelled(url)),
        outcome = tokio::time::timeout(timeout, step) => match outcome {
            Err(_) => Err(E::timed_out(url, timeout)),
            Ok(Err(e)) if e.is_timeout() => Err(E::timed_out(url, timeout)),
            Ok(Err(e)) => Err(E::network(url, e)),
            Ok(Ok(value)) => Ok(value),
        },
    }
}
