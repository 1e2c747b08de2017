//! Session configuration.
//!
//! Defaults reproduce the fixed measurement parameters; the `with_*` setters
//! exist so callers (and tests) can point a session at other endpoints or use
//! shorter timeouts.

use std::time::Duration;

use super::constants::{CHUNK_SIZE, DEFAULT_CANDIDATE_URLS, MAX_REDIRECTS, TIMEOUT};
use super::error::SessionError;
use crate::user_agent;

/// Parameters for one throughput session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedTestConfig {
    candidate_urls: Vec<String>,
    chunk_size: u64,
    timeout: Duration,
    max_redirects: u32,
    user_agent: String,
}

impl Default for SpeedTestConfig {
    fn default() -> Self {
        Self {
            candidate_urls: DEFAULT_CANDIDATE_URLS
                .iter()
                .map(|url| (*url).to_string())
                .collect(),
            chunk_size: CHUNK_SIZE,
            timeout: TIMEOUT,
            max_redirects: MAX_REDIRECTS,
            user_agent: user_agent::default_user_agent(),
        }
    }
}

impl SpeedTestConfig {
    /// Creates a configuration with the default parameters and candidates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the candidate list. Order is preserved in the report.
    #[must_use]
    pub fn with_candidate_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidate_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the number of bytes downloaded per candidate.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the redirect bound for capability checks.
    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Sets the User-Agent sent with every request.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Candidate URLs in test order.
    #[must_use]
    pub fn candidate_urls(&self) -> &[String] {
        &self.candidate_urls
    }

    /// Bytes downloaded per candidate.
    #[must_use]
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Redirect bound for capability checks.
    #[must_use]
    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    /// User-Agent sent with every request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Value of the `Range` header for the measurement window.
    #[must_use]
    pub fn range_header(&self) -> String {
        format!("bytes=0-{}", self.chunk_size.saturating_sub(1))
    }

    /// Rejects configurations that cannot produce a measurement.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfig`] for a zero chunk size, a zero
    /// timeout, or an empty User-Agent.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.chunk_size == 0 {
            return Err(SessionError::InvalidConfig {
                reason: "chunk size must be greater than zero",
            });
        }
        if self.timeout.is_zero() {
            return Err(SessionError::InvalidConfig {
                reason: "timeout must be greater than zero",
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(SessionError::InvalidConfig {
                reason: "user agent must not be empty",
            });
        }
        Ok(())
    }
}
