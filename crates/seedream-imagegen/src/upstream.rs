use async_trait::async_trait;
use axum::body::Bytes;
use http::{HeaderValue, StatusCode};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use seedream_config::UpstreamConfig;

use crate::{
    error::{ImageGenError, Result},
    types::UpstreamPayload,
};

/// Raw HTTP answer from the upstream, successful or not
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// Something that can run one image generation call
///
/// Only transport-level failures are errors; any HTTP response, including
/// 4xx and 5xx, comes back as a reply.
#[async_trait]
pub(crate) trait ImageGenUpstream: Send + Sync {
    async fn generate(&self, payload: &UpstreamPayload) -> Result<UpstreamReply>;
}

/// Client for the Ark image generation endpoint
pub(crate) struct ArkUpstream {
    client: Client,
    url: String,
    api_key: SecretString,
}

impl ArkUpstream {
    /// Build a client with the configured per-call timeout
    pub fn new(config: &UpstreamConfig, api_key: SecretString) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ImageGenError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.generations_url(),
            api_key,
        })
    }
}

#[async_trait]
impl ImageGenUpstream for ArkUpstream {
    async fn generate(&self, payload: &UpstreamPayload) -> Result<UpstreamReply> {
        tracing::debug!(url = %self.url, model = %payload.model, "sending image generation request");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, timeout = e.is_timeout(), "image generation request failed");
                ImageGenError::Connection(e.to_string())
            })?;

        let status = response.status();
        let content_type = response.headers().get(http::header::CONTENT_TYPE).cloned();

        let body = response.bytes().await.map_err(|e| {
            tracing::error!(error = %e, %status, "failed to read image generation response");
            ImageGenError::Connection(e.to_string())
        })?;

        if status.is_success() {
            tracing::debug!(%status, bytes = body.len(), "image generation request complete");
        } else {
            tracing::warn!(%status, "upstream returned an error");
        }

        Ok(UpstreamReply {
            status,
            content_type,
            body,
        })
    }
}
