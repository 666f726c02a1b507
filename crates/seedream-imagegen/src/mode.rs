use seedream_config::UpstreamConfig;
use serde_json::{Value, json};

use crate::types::{GenerationRequest, Mode, UpstreamPayload};

/// What the relay will send upstream for one request
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// A single call whose response is forwarded as-is
    Single(UpstreamPayload),
    /// `count` identical single-image calls, aggregated afterwards
    FanOut { payload: UpstreamPayload, count: usize },
}

/// Decide between a single upstream call and an exact-count fan-out
pub fn select(request: &GenerationRequest, upstream: &UpstreamConfig) -> Dispatch {
    let count = request.images_count.clamp(1, upstream.max_images.max(1));
    let mut payload = request.base_payload();

    if count <= 1 {
        return Dispatch::Single(payload);
    }

    match request.mode {
        Mode::Exact => {
            // Native sequential batching would multiply the images per call
            payload.sequential_image_generation = Some(Value::from("disabled"));
            payload.sequential_image_generation_options = None;
            payload.stream = Some(false);

            Dispatch::FanOut {
                payload,
                count: count as usize,
            }
        }
        Mode::Batch if upstream.supports_native_batch(&request.model) => {
            payload.sequential_image_generation = Some(Value::from("auto"));
            payload.sequential_image_generation_options = Some(json!({ "max_images": count }));
            Dispatch::Single(payload)
        }
        Mode::Batch => {
            tracing::debug!(
                model = %request.model,
                requested = count,
                "model has no native batch support, sending a single request"
            );
            Dispatch::Single(payload)
        }
    }
}
