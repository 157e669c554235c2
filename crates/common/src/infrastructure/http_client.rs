use std::time::Duration;

use eyre::{Result, WrapErr};
use reqwest::{Client, ClientBuilder};

/// Builds pooled HTTP clients for outbound calls (verification provider, webhook sink)
pub struct HttpClientFactory {
    default_timeout: Duration,
    max_idle_per_host: usize,
}

impl HttpClientFactory {
    /// Create a new HTTP client factory with default settings
    pub fn new() -> Self {
        Self { default_timeout: Duration::from_secs(10), max_idle_per_host: 10 }
    }

    /// Factory whose clients time out after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { default_timeout: timeout, ..Self::new() }
    }

    /// Create a new HTTP client with connection pooling
    pub fn create_client(&self) -> Result<Client> {
        ClientBuilder::new()
            .pool_max_idle_per_host(self.max_idle_per_host)
            .timeout(self.default_timeout)
            .build()
            .wrap_err("Failed to create HTTP client")
    }
}

impl Default for HttpClientFactory {
    fn default() -> Self {
        Self::new()
    }
}
