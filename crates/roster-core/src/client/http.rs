//! HTTP layer: status mapping and envelope decoding.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes. Each call here is a single attempt; retries
//! belong to [`crate::retry`].

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{RosterError, RosterResult};
use crate::types::ApiEnvelope;

/// HTTP backend (holds reqwest client and base URL).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
}

impl HttpBackend {
    /// Send one request and decode the `data` member of the envelope.
    pub(crate) async fn call<B, T>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        resource: &str,
    ) -> RosterResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(method = %method, url, status = status.as_u16(), "upstream response");

        if !status.is_success() {
            return Err(map_status(status, response, resource).await);
        }

        let envelope: ApiEnvelope<T> =
            response
                .json()
                .await
                .map_err(|e| RosterError::InvalidResponse {
                    message: format!("failed to parse response for {}: {}", resource, e),
                })?;

        envelope.data.ok_or_else(|| RosterError::InvalidResponse {
            message: format!(
                "response for {} has no data (status: {})",
                resource,
                envelope.status.as_deref().unwrap_or("none")
            ),
        })
    }
}

async fn map_status(status: StatusCode, response: reqwest::Response, resource: &str) -> RosterError {
    match status.as_u16() {
        404 => RosterError::NotFound {
            resource: resource.to_string(),
        },

        429 => {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);

            RosterError::RateLimited { retry_after }
        }

        500..=599 => RosterError::Unavailable {
            status: status.as_u16(),
            message: body_message(response, status).await,
        },

        _ => RosterError::Client {
            status: status.as_u16(),
            message: body_message(response, status).await,
        },
    }
}

/// Upstream `status` text from an error envelope, else the raw body (truncated).
async fn body_message(response: reqwest::Response, status: StatusCode) -> String {
    let body = match response.text().await {
        Ok(body) if !body.is_empty() => body,
        _ => return status.to_string(),
    };

    serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
        .ok()
        .and_then(|envelope| envelope.status)
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Interpret the `data` flag of a delete response.
pub(crate) fn parse_delete_flag(data: &serde_json::Value) -> bool {
    match data {
        serde_json::Value::Bool(flag) => *flag,
        serde_json::Value::String(text) => text.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}
