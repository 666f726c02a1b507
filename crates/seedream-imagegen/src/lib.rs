#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod aggregate;
mod error;
mod mode;
mod server;
mod types;
mod upstream;
mod validate;

use std::sync::Arc;

use axum::{Json, Router, extract::State, extract::rejection::JsonRejection, routing::post};
use http::StatusCode;
use serde_json::Value;

pub use error::{ImageGenError, Result};
pub use server::{Relayed, Server};
pub use types::{AggregateResponse, DataItem, ImageItem, RawGenerationRequest, Usage};

use server::ImageGenServerBuilder;

/// Build the relay from configuration
///
/// # Errors
///
/// Returns an error if the upstream HTTP client cannot be created
pub fn build_server(config: &seedream_config::Config) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        ImageGenServerBuilder::new(config)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize image generation relay: {e}"))?,
    );
    Ok(server)
}

/// Create the endpoint router for image generation
///
/// `/api/generate` is an alias kept for browser front-ends that post there.
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new()
        .route("/generate", post(generate))
        .route("/api/generate", post(generate))
}

/// Handle image generation requests
async fn generate(
    State(server): State<Arc<Server>>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Relayed> {
    server.ensure_api_key()?;

    let Json(body) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected generation request body");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ImageGenError::PayloadTooLarge(rejection.body_text())
        } else {
            ImageGenError::InvalidRequest(rejection.body_text())
        }
    })?;

    server.generate(RawGenerationRequest::from_body(body)).await
}
