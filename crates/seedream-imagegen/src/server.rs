use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    response::{IntoResponse, Response},
};
use http::{HeaderValue, header};
use seedream_config::UpstreamConfig;
use serde_json::json;

use crate::{
    aggregate::{self, UpstreamResult},
    error::{ImageGenError, Result},
    mode::{self, Dispatch},
    types::{AggregateResponse, RawGenerationRequest},
    upstream::{ArkUpstream, ImageGenUpstream, UpstreamReply},
    validate::validate,
};

/// Relays generation requests to the upstream API
pub struct Server {
    /// Absent when no API key is configured
    upstream: Option<Arc<dyn ImageGenUpstream>>,
    config: UpstreamConfig,
}

/// Outcome of a relayed request
#[derive(Debug)]
pub enum Relayed {
    /// Upstream status and body of a single call, untouched
    Passthrough(UpstreamReply),
    /// Merged results of an exact-count fan-out
    Aggregate(AggregateResponse),
}

impl Server {
    pub(crate) fn with_upstream(config: UpstreamConfig, upstream: Option<Arc<dyn ImageGenUpstream>>) -> Self {
        Self { upstream, config }
    }

    /// Fail early when the relay has no key to call the upstream with
    pub fn ensure_api_key(&self) -> Result<()> {
        self.upstream().map(|_| ())
    }

    fn upstream(&self) -> Result<&Arc<dyn ImageGenUpstream>> {
        self.upstream.as_ref().ok_or(ImageGenError::MissingApiKey)
    }

    /// Validate, dispatch, and relay one generation request
    pub async fn generate(&self, raw: RawGenerationRequest) -> Result<Relayed> {
        let upstream = self.upstream()?;
        let request = validate(raw)?;

        match mode::select(&request, &self.config) {
            Dispatch::Single(payload) => {
                let reply = upstream.generate(&payload).await?;
                Ok(Relayed::Passthrough(reply))
            }
            Dispatch::FanOut { payload, count } => {
                tracing::debug!(model = %request.model, count, "fanning out exact-count request");

                let payload = Arc::new(payload);
                let results = aggregate::fan_out(count, |index| {
                    let upstream = Arc::clone(upstream);
                    let payload = Arc::clone(&payload);
                    async move {
                        let result = UpstreamResult::from_reply(upstream.generate(&payload).await);
                        if let UpstreamResult::Failure { status_code, message } = &result {
                            tracing::warn!(index, status_code, %message, "fan-out call failed");
                        }
                        result
                    }
                })
                .await;

                let response = aggregate::aggregate(request.model, results);
                tracing::debug!(
                    generated_images = response.usage.generated_images,
                    slots = response.data.len(),
                    "fan-out complete"
                );

                Ok(Relayed::Aggregate(response))
            }
        }
    }
}

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        match self {
            Self::Aggregate(response) => Json(response).into_response(),
            Self::Passthrough(reply) if reply.body.is_empty() && !reply.status.is_success() => {
                let message = format!("Request failed with status code {}", reply.status.as_u16());
                (reply.status, Json(json!({ "error": { "message": message } }))).into_response()
            }
            Self::Passthrough(reply) => {
                let content_type = reply
                    .content_type
                    .unwrap_or_else(|| HeaderValue::from_static("application/json"));

                let mut response = Response::new(Body::from(reply.body));
                *response.status_mut() = reply.status;
                response.headers_mut().insert(header::CONTENT_TYPE, content_type);
                response
            }
        }
    }
}

/// Builder for constructing the relay from configuration
pub struct ImageGenServerBuilder<'a> {
    config: &'a seedream_config::Config,
}

impl<'a> ImageGenServerBuilder<'a> {
    pub fn new(config: &'a seedream_config::Config) -> Self {
        Self { config }
    }

    pub fn build(self) -> Result<Server> {
        let upstream_config = self.config.upstream.clone();

        let upstream: Option<Arc<dyn ImageGenUpstream>> = match upstream_config.api_key() {
            Some(api_key) => {
                tracing::debug!(url = %upstream_config.generations_url(), "initializing upstream client");
                Some(Arc::new(ArkUpstream::new(&upstream_config, api_key.clone())?))
            }
            None => {
                tracing::warn!("no upstream API key configured, generation requests will be rejected");
                None
            }
        };

        Ok(Server::with_upstream(upstream_config, upstream))
    }
}
