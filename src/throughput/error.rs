//! Error types for the throughput module.
//!
//! Probe and measurement failures are per-candidate: they are recorded in the
//! session report and never abort a session. Only [`SessionError`] escapes to
//! the caller.

use std::time::Duration;

use thiserror::Error;

/// Why a capability check could not establish that a candidate is usable.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error probing {url}: {source}")]
    Network {
        /// The URL being probed when the error occurred.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// No response arrived within the per-request timeout.
    #[error("timeout probing {url} after {}ms", .timeout.as_millis())]
    Timeout {
        /// The URL being probed.
        url: String,
        /// The timeout that expired.
        timeout: Duration,
    },

    /// The session was cancelled while the probe was in flight.
    #[error("probe of {url} cancelled")]
    Cancelled {
        /// The URL being probed.
        url: String,
    },

    /// The redirect chain exceeded the configured bound.
    #[error("too many redirects probing {url} (limit {limit})")]
    TooManyRedirects {
        /// The original candidate URL.
        url: String,
        /// The redirect bound that was exceeded.
        limit: u32,
    },

    /// The candidate URL is malformed or uses an unsupported scheme.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// A redirect `Location` could not be resolved against the current URL.
    #[error("invalid redirect location {location:?} from {url}")]
    InvalidLocation {
        /// The URL that returned the redirect.
        url: String,
        /// The raw header value.
        location: String,
    },
}

impl ProbeError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            timeout,
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Creates a too-many-redirects error.
    pub fn too_many_redirects(url: impl Into<String>, limit: u32) -> Self {
        Self::TooManyRedirects {
            url: url.into(),
            limit,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an invalid redirect location error.
    pub fn invalid_location(url: impl Into<String>, location: impl Into<String>) -> Self {
        Self::InvalidLocation {
            url: url.into(),
            location: location.into(),
        }
    }
}

/// Why a ranged download could not produce a measurement.
#[derive(Debug, Error)]
pub enum MeasureError {
    /// Network-level error while sending the request or reading the body.
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL being downloaded.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// No response or body bytes arrived within the per-request timeout.
    #[error("timeout downloading {url} after {}ms", .timeout.as_millis())]
    Timeout {
        /// The URL being downloaded.
        url: String,
        /// The timeout that expired.
        timeout: Duration,
    },

    /// The session was cancelled while the download was in flight.
    #[error("download of {url} cancelled")]
    Cancelled {
        /// The URL being downloaded.
        url: String,
    },

    /// The server answered the ranged request with something other than 200/206.
    #[error("invalid status code {status} downloading {url}")]
    InvalidStatus {
        /// The URL being downloaded.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
}

impl MeasureError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            timeout,
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Creates an invalid status error.
    pub fn invalid_status(url: impl Into<String>, status: u16) -> Self {
        Self::InvalidStatus {
            url: url.into(),
            status,
        }
    }

    /// Returns true if the failure was a timeout rather than a server answer.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Failures that prevent a session from running at all.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The configuration cannot produce a meaningful measurement.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: &'static str,
    },
}
