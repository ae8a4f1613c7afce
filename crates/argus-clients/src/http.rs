use std::time::Duration;

use reqwest::Client;

use crate::error::AdapterError;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Transport settings shared by every adapter.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure, for transient errors only.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl HttpSettings {
    #[must_use]
    pub fn new(timeout_secs: u64, user_agent: &str, max_retries: u32, retry_backoff_ms: u64) -> Self {
        Self {
            timeout_secs,
            user_agent: user_agent.to_string(),
            max_retries,
            retry_backoff_ms,
        }
    }

    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub(crate) fn build_client(&self) -> Result<Client, AdapterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS.min(self.timeout_secs.max(1))))
            .user_agent(&self.user_agent)
            .build()?;
        Ok(client)
    }
}
