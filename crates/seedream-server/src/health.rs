use std::sync::Arc;

use axum::{Json, extract::State};
use seedream_config::Config;
use serde::Serialize;

/// Configuration facts reported by the health probe
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    ok: bool,
    api_base: String,
    has_key: bool,
}

impl HealthStatus {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ok: true,
            api_base: config.upstream.api_base_str().to_string(),
            has_key: config.upstream.api_key().is_some(),
        }
    }
}

/// Health check handler
pub async fn health_handler(State(status): State<Arc<HealthStatus>>) -> Json<HealthStatus> {
    Json(status.as_ref().clone())
}
