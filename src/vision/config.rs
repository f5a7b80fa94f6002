//! Client configuration.

use std::time::Duration;

/// Default per-attempt request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.moondream.ai/v1";

/// Default number of retry attempts after the first request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between attempts. Attempt `n` waits `n` times this.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Default header carrying the API key.
pub const DEFAULT_AUTH_HEADER: &str = "X-Api-Auth";

/// Configuration for the vision client.
///
/// Built once and handed to [`VisionClient::new`](super::VisionClient::new);
/// the client never mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Timeout applied to each HTTP attempt, not the whole operation.
    pub timeout: Duration,
    pub base_url: String,
    /// Retries after the first attempt, so `max_retries + 1` tries in total.
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub auth_header: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
        }
    }
}

impl ClientConfig {
    /// Set the per-attempt request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the base URL for API requests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Set the maximum number of retry attempts for failed requests.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay of the linear backoff.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Set the name of the header that carries the API key.
    pub fn with_auth_header(mut self, auth_header: impl Into<String>) -> Self {
        self.auth_header = auth_header.into();
        self
    }

    /// Total number of attempts an operation may make.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Backoff taken before `attempt` (1-based retry number).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt)
    }

    pub(crate) fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://api.moondream.ai/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
        assert_eq!(config.auth_header, "X-Api-Auth");
    }

    #[test]
    fn test_client_options() {
        let config = ClientConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_base_url("https://custom.api.example.com/")
            .with_max_retries(0)
            .with_retry_delay(Duration::from_millis(250));

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.base_url, "https://custom.api.example.com");
        assert_eq!(config.max_attempts(), 1);
        assert_eq!(
            config.endpoint_url("/caption"),
            "https://custom.api.example.com/caption"
        );
    }

    #[test]
    fn test_linear_backoff() {
        let config = ClientConfig::default().with_retry_delay(Duration::from_millis(100));
        assert_eq!(config.backoff_for(1), Duration::from_millis(100));
        assert_eq!(config.backoff_for(2), Duration::from_millis(200));
        assert_eq!(config.backoff_for(3), Duration::from_millis(300));
    }
}
