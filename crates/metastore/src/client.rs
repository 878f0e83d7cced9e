//! Metastore gateway client.
//!
//! [`MetastoreClient`] is the seam the rest of the subsystem is written
//! against; [`HttpMetastoreClient`] talks to the HTTP gateway with retrying
//! transport. Any call may fail; callers treat failure as recoverable and
//! degrade rather than propagate.

use crate::config::MetastoreConfig;
use crate::error::{MetastoreError, Result};
use crate::types::{DatabasesResponse, TableDescriptor, TablesResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

/// Remote-procedure interface to the Hive metastore.
#[async_trait]
pub trait MetastoreClient: Send + Sync {
    async fn list_databases(&self) -> Result<Vec<String>>;

    async fn list_tables(&self, db: &str) -> Result<Vec<String>>;

    async fn get_table(&self, db: &str, table: &str) -> Result<TableDescriptor>;

    /// Re-establish connectivity. Fails with [`MetastoreError::Connection`]
    /// when the remote is unreachable.
    async fn reconnect(&self) -> Result<()>;
}

/// HTTP implementation of [`MetastoreClient`] with automatic retries.
pub struct HttpMetastoreClient {
    http: RwLock<ClientWithMiddleware>,
    config: MetastoreConfig,
}

impl HttpMetastoreClient {
    pub fn new(config: MetastoreConfig) -> Result<Self> {
        config.validate()?;
        let http = build_http(&config)?;
        Ok(Self {
            http: RwLock::new(http),
            config,
        })
    }

    pub fn config(&self) -> &MetastoreConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        // hold the lock only to clone the handle, not across the request
        let http = self.http.read().await.clone();
        let response = http.get(&url).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(MetastoreError::NotFound(path.to_string())),
            _ => Err(MetastoreError::Server {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

#[async_trait]
impl MetastoreClient for HttpMetastoreClient {
    async fn list_databases(&self) -> Result<Vec<String>> {
        let response: DatabasesResponse = self.get_json("/api/v1/databases").await?;
        Ok(response.databases)
    }

    async fn list_tables(&self, db: &str) -> Result<Vec<String>> {
        let path = format!("/api/v1/databases/{}/tables", urlencoding::encode(db));
        let response: TablesResponse = self.get_json(&path).await?;
        Ok(response.tables)
    }

    async fn get_table(&self, db: &str, table: &str) -> Result<TableDescriptor> {
        let path = format!(
            "/api/v1/databases/{}/tables/{}",
            urlencoding::encode(db),
            urlencoding::encode(table)
        );
        self.get_json(&path).await
    }

    /// Rebuild the connection pool and probe the gateway. The old pool is
    /// only swapped out once the probe succeeds, so a failed reconnect
    /// leaves the client no worse off than before.
    async fn reconnect(&self) -> Result<()> {
        let rebuilt = build_http(&self.config)?;

        let url = self.url("/health");
        let response = rebuilt
            .get(&url)
            .send()
            .await
            .map_err(|e| MetastoreError::Connection(e.to_string()))?;
        if !response.status().is_success() {
            return Err(MetastoreError::Connection(format!(
                "health probe returned {}",
                response.status()
            )));
        }

        *self.http.write().await = rebuilt;
        tracing::info!(url = %self.config.base_url, "metastore connection re-established");
        Ok(())
    }
}

fn build_http(config: &MetastoreConfig) -> Result<ClientWithMiddleware> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("meridian-metastore")),
    );

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .build()?;

    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(config.retry_initial_delay, config.retry_max_delay)
        .build_with_max_retries(config.max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}
