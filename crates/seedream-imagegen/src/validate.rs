use seedream_config::MAX_IMAGES_LIMIT;
use serde_json::{Number, Value};

use crate::{
    error::{ImageGenError, Result},
    types::{GenerationRequest, Mode, RawGenerationRequest, UpstreamPayload},
};

const REQUIRED_FIELDS_MESSAGE: &str = "model and prompt are required";

/// Validate a raw request body and normalize its optional fields
///
/// Fails before anything is sent upstream when `model` or `prompt` is
/// missing, empty, or not a string.
pub fn validate(raw: RawGenerationRequest) -> Result<GenerationRequest> {
    let (Some(model), Some(prompt)) = (non_empty_string(raw.model), non_empty_string(raw.prompt)) else {
        return Err(ImageGenError::InvalidRequest(REQUIRED_FIELDS_MESSAGE.to_string()));
    };

    Ok(GenerationRequest {
        model,
        prompt,
        image: raw.image,
        size: raw.size.filter(is_truthy),
        seed: raw.seed.and_then(number),
        sequential_image_generation: raw.sequential_image_generation.filter(is_truthy),
        sequential_image_generation_options: raw.sequential_image_generation_options.filter(is_truthy),
        stream: raw.stream.as_ref().and_then(Value::as_bool),
        guidance_scale: raw.guidance_scale.and_then(number),
        response_format: raw.response_format.filter(is_truthy),
        watermark: raw.watermark.as_ref().and_then(Value::as_bool),
        images_count: images_count(raw.images_count.as_ref()),
        mode: mode(raw.mode.as_ref()),
    })
}

impl GenerationRequest {
    /// Payload for a plain single upstream call
    ///
    /// Watermarking is off unless the caller explicitly asked for it.
    pub fn base_payload(&self) -> UpstreamPayload {
        UpstreamPayload {
            model: self.model.clone(),
            prompt: self.prompt.clone(),
            image: self.image.clone(),
            size: self.size.clone(),
            seed: self.seed.clone(),
            sequential_image_generation: self.sequential_image_generation.clone(),
            sequential_image_generation_options: self.sequential_image_generation_options.clone(),
            stream: self.stream,
            guidance_scale: self.guidance_scale.clone(),
            response_format: self.response_format.clone(),
            watermark: self.watermark.unwrap_or(false),
        }
    }
}

fn non_empty_string(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn number(value: Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n),
        _ => None,
    }
}

/// JavaScript-style truthiness: `""`, `0`, `false` and `null` mean unset
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parse `images_count` leniently and clamp it to `1..=MAX_IMAGES_LIMIT`
///
/// Numbers and numeric strings are accepted; fractions are truncated.
/// Anything else, including zero, counts as one image.
fn images_count(value: Option<&Value>) -> u32 {
    let requested = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite() && *n != 0.0)
    .unwrap_or(1.0);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let truncated = requested.trunc().clamp(1.0, f64::from(MAX_IMAGES_LIMIT)) as u32;
    truncated
}

fn mode(value: Option<&Value>) -> Mode {
    match value.and_then(Value::as_str) {
        Some("exact") => Mode::Exact,
        _ => Mode::Batch,
    }
}
