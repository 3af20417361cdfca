//! Segmentation API Client
//!
//! The upstream capability the gateway calls on cache misses, and its HTTP
//! implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::cache::RequestSpec;
use crate::config::Config;
use crate::error::{GatewayError, Result};

/// Fixed timeout for a single upstream request.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(45);

/// Runs one analytics query described by a [`RequestSpec`].
#[async_trait]
pub trait SegmentationApi: Send + Sync {
    /// Issues the query and returns the raw JSON body.
    async fn query(&self, spec: &RequestSpec) -> Result<Value>;
}

// == HTTP Client ==
/// reqwest-backed client for the analytics query API.
///
/// Sends `GET {base_url}{endpoint}` with `project_id` plus the spec's
/// parameters, authenticated with the service account via Basic auth.
#[derive(Debug, Clone)]
pub struct HttpSegmentationClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    username: String,
    secret: String,
}

impl HttpSegmentationClient {
    /// Builds a client from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.base_url,
            &config.project_id,
            &config.sa_username,
            &config.sa_secret,
        )
    }

    pub fn new(base_url: &str, project_id: &str, username: &str, secret: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            username: username.to_string(),
            secret: secret.to_string(),
        })
    }

    fn url_for(&self, spec: &RequestSpec) -> String {
        format!("{}{}", self.base_url, spec.endpoint())
    }
}

#[async_trait]
impl SegmentationApi for HttpSegmentationClient {
    #[instrument(skip(self, spec), fields(endpoint = %spec.endpoint()))]
    async fn query(&self, spec: &RequestSpec) -> Result<Value> {
        let mut params: Vec<(&str, &str)> = vec![("project_id", self.project_id.as_str())];
        params.extend(spec.params().iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let response = self
            .http
            .get(self.url_for(spec))
            .query(&params)
            .basic_auth(&self.username, Some(&self.secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Unavailable(format!(
                        "request timed out after {}s",
                        UPSTREAM_TIMEOUT.as_secs()
                    ))
                } else {
                    GatewayError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Upstream rate limit hit");
            return Err(GatewayError::RateLimited);
        }
        if status.as_u16() >= 400 {
            let body = response.text().await.map_err(|e| {
                warn!(status = status.as_u16(), error = %e, "Failed to read upstream error body");
                GatewayError::Unavailable(format!(
                    "upstream answered {} but the body could not be read: {}",
                    status.as_u16(),
                    e
                ))
            })?;
            warn!(status = status.as_u16(), "Upstream returned an error");
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let payload = response
            .json::<Value>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        debug!(status = status.as_u16(), "Upstream query succeeded");
        Ok(payload)
    }
}
