//! Client and polling configuration.

use crate::core::digest::DigestAlgorithm;
use crate::core::error::ScanError;

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Default service root for MetaDefender Cloud.
pub const DEFAULT_BASE_URL: &str = "https://api.metadefender.com/v4";

/// Bounds and pacing for the result poll loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Delay between consecutive poll requests. Zero disables the delay.
    pub poll_interval: Duration,

    /// Maximum number of poll requests before giving up.
    pub max_attempts: u32,

    /// Maximum wall-clock time spent polling before giving up.
    pub max_poll_time: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            max_attempts: 1500,
            max_poll_time: Duration::from_secs(300),
        }
    }
}

impl PollConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delay between polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the maximum number of polls (at least 1).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the maximum polling time.
    pub fn with_max_poll_time(mut self, max: Duration) -> Self {
        self.max_poll_time = max;
        self
    }
}

/// Configuration shared by every phase of the workflow.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key sent in the `apikey` header (kept secret).
    pub api_key: SecretString,

    /// Service root, without a trailing slash.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Digest used for the cache lookup.
    pub digest_algorithm: DigestAlgorithm,

    /// Poll loop settings.
    pub poll: PollConfig,
}

impl ClientConfig {
    /// Creates a configuration with the given API key and defaults elsewhere.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into().into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            digest_algorithm: DigestAlgorithm::default(),
            poll: PollConfig::default(),
        }
    }

    /// Sets the service root.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the digest algorithm.
    pub fn with_digest_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.digest_algorithm = algorithm;
        self
    }

    /// Sets the poll configuration.
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Returns the API key.
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Joins `path` onto the service root.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Checks the configuration for values the workflow cannot run with.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.api_key().trim().is_empty() {
            return Err(ScanError::configuration("API key must not be empty"));
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(ScanError::configuration(format!(
                "base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(ScanError::configuration("request timeout must be non-zero"));
        }
        if self.poll.max_attempts == 0 {
            return Err(ScanError::configuration("maximum poll attempts must be at least 1"));
        }
        if self.poll.max_poll_time.is_zero() {
            return Err(ScanError::configuration("maximum poll time must be non-zero"));
        }
        Ok(())
    }
}
