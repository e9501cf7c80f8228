//! Upstream record API client.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Method;
use tracing::debug;

use crate::error::{RosterError, RosterResult};
use crate::types::{DeleteRequest, Record, RecordInput, RosterConfig};
use crate::ROSTER_USER_AGENT;

mod http;

use http::{parse_delete_flag, HttpBackend};

/// Operations offered by the upstream record API.
///
/// Every method performs exactly one attempt; retrying is the caller's job.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// All records.
    async fn list(&self) -> RosterResult<Vec<Record>>;

    /// One record by id.
    async fn get(&self, id: &str) -> RosterResult<Record>;

    /// Create a record; upstream assigns the id.
    async fn create(&self, input: &RecordInput) -> RosterResult<Record>;

    /// Delete by name. Returns upstream's deletion flag.
    async fn delete_by_name(&self, name: &str) -> RosterResult<bool>;
}

/// [`RecordApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRecordApi {
    http: HttpBackend,
}

impl HttpRecordApi {
    pub fn new(config: &RosterConfig) -> RosterResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(ROSTER_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| RosterError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http: HttpBackend {
                client,
                base_url: config.api_url.trim_end_matches('/').to_string(),
            },
        })
    }

    pub fn base_url(&self) -> &str {
        &self.http.base_url
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/{}", self.http.base_url, id)
    }
}

#[async_trait]
impl RecordApi for HttpRecordApi {
    async fn list(&self) -> RosterResult<Vec<Record>> {
        debug!(url = %self.http.base_url, "listing records");
        self.http
            .call(Method::GET, &self.http.base_url, None::<&()>, "records")
            .await
    }

    async fn get(&self, id: &str) -> RosterResult<Record> {
        let url = self.record_url(id);
        debug!(url = %url, "fetching record");
        self.http
            .call(Method::GET, &url, None::<&()>, &format!("record {}", id))
            .await
    }

    async fn create(&self, input: &RecordInput) -> RosterResult<Record> {
        debug!(url = %self.http.base_url, name = %input.name, "creating record");
        self.http
            .call(Method::POST, &self.http.base_url, Some(input), "new record")
            .await
    }

    async fn delete_by_name(&self, name: &str) -> RosterResult<bool> {
        debug!(url = %self.http.base_url, name, "deleting record by name");
        let data: serde_json::Value = self
            .http
            .call(
                Method::DELETE,
                &self.http.base_url,
                Some(&DeleteRequest { name }),
                &format!("record named {}", name),
            )
            .await?;
        Ok(parse_delete_flag(&data))
    }
}
