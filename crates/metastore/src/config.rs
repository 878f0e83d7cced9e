//! Metastore subsystem configuration and builder.

use crate::error::{MetastoreError, Result};
use std::time::Duration;

/// Configuration for the metastore client, cache, reconnect supervisor, and
/// mirror passes.
#[derive(Debug, Clone)]
pub struct MetastoreConfig {
    /// Base URL of the metastore HTTP gateway (e.g. "http://localhost:8083").
    pub base_url: String,
    /// Request timeout (default: 30 seconds).
    pub timeout: Duration,
    /// Maximum number of retries for transient failures (default: 3).
    pub max_retries: u32,
    /// Initial retry delay for exponential backoff (default: 100ms).
    pub retry_initial_delay: Duration,
    /// Maximum retry delay (default: 10 seconds).
    pub retry_max_delay: Duration,
    /// Database name substituted for an empty/unset name (default: "default").
    pub default_database: String,
    /// Databases a mirror pass targets; empty means enumerate the catalog.
    pub database_filter: Vec<String>,
    /// Key-space bound for each cache map (default: 4096 entries).
    pub cache_capacity: usize,
    /// Database-level fan-out limit for mirror passes (default: 4).
    pub mirror_concurrency: usize,
    /// Reconnect queue capacity; submissions beyond it are dropped
    /// (default: 3).
    pub reconnect_queue_capacity: usize,
    /// Reconnect queue consumers (default: 1).
    pub reconnect_workers: usize,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for MetastoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8083".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_initial_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(10),
            default_database: "default".to_string(),
            database_filter: Vec::new(),
            cache_capacity: 4096,
            mirror_concurrency: 4,
            reconnect_queue_capacity: 3,
            reconnect_workers: 1,
            user_agent: format!("meridian-metastore/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl MetastoreConfig {
    /// Create a new configuration builder.
    pub fn builder(base_url: impl Into<String>) -> MetastoreConfigBuilder {
        MetastoreConfigBuilder::new(base_url)
    }

    /// Minimum allowed timeout value.
    pub const MIN_TIMEOUT: Duration = Duration::from_millis(100);

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(MetastoreError::Config(
                "base_url cannot be empty".to_string(),
            ));
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| MetastoreError::Config(format!("Invalid base_url: {}", e)))?;

        if self.retry_initial_delay > self.retry_max_delay {
            return Err(MetastoreError::Config(format!(
                "retry_initial_delay ({:?}) must be <= retry_max_delay ({:?})",
                self.retry_initial_delay, self.retry_max_delay
            )));
        }

        if self.timeout < Self::MIN_TIMEOUT {
            return Err(MetastoreError::Config(format!(
                "timeout ({:?}) must be >= {:?}",
                self.timeout,
                Self::MIN_TIMEOUT
            )));
        }

        if self.default_database.trim().is_empty() {
            return Err(MetastoreError::Config(
                "default_database cannot be empty".to_string(),
            ));
        }

        if self.cache_capacity == 0 {
            return Err(MetastoreError::Config(
                "cache_capacity must be > 0".to_string(),
            ));
        }

        if self.mirror_concurrency == 0 {
            return Err(MetastoreError::Config(
                "mirror_concurrency must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse a comma-separated database filter; whitespace and empty segments
/// are dropped.
pub fn parse_database_filter(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builder for metastore configuration.
#[derive(Debug)]
pub struct MetastoreConfigBuilder {
    config: MetastoreConfig,
}

impl MetastoreConfigBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: MetastoreConfig {
                base_url: base_url.into(),
                ..Default::default()
            },
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn retry_initial_delay(mut self, delay: Duration) -> Self {
        self.config.retry_initial_delay = delay;
        self
    }

    pub fn retry_max_delay(mut self, delay: Duration) -> Self {
        self.config.retry_max_delay = delay;
        self
    }

    pub fn default_database(mut self, name: impl Into<String>) -> Self {
        self.config.default_database = name.into();
        self
    }

    /// Set the mirror database filter from a comma-separated list.
    pub fn database_filter(mut self, raw: &str) -> Self {
        self.config.database_filter = parse_database_filter(raw);
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    pub fn mirror_concurrency(mut self, limit: usize) -> Self {
        self.config.mirror_concurrency = limit;
        self
    }

    pub fn reconnect_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.reconnect_queue_capacity = capacity;
        self
    }

    pub fn reconnect_workers(mut self, workers: usize) -> Self {
        self.config.reconnect_workers = workers;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration, validating all settings.
    pub fn build(self) -> Result<MetastoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
