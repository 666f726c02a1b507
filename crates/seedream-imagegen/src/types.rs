use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Generation request body as received from the client
///
/// Every field is kept as raw JSON so that wrongly-typed optional values can
/// be dropped instead of failing the whole request. Unknown fields are
/// ignored and never reach the upstream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGenerationRequest {
    #[serde(default)]
    pub model: Option<Value>,
    #[serde(default)]
    pub prompt: Option<Value>,
    /// Reference image(s): a URL/data-URL string or an array of them
    #[serde(default)]
    pub image: Option<Value>,
    #[serde(default)]
    pub size: Option<Value>,
    #[serde(default)]
    pub seed: Option<Value>,
    #[serde(default)]
    pub sequential_image_generation: Option<Value>,
    #[serde(default)]
    pub sequential_image_generation_options: Option<Value>,
    #[serde(default)]
    pub stream: Option<Value>,
    #[serde(default)]
    pub guidance_scale: Option<Value>,
    #[serde(default)]
    pub response_format: Option<Value>,
    #[serde(default)]
    pub watermark: Option<Value>,
    #[serde(default)]
    pub images_count: Option<Value>,
    #[serde(default)]
    pub mode: Option<Value>,
}

impl RawGenerationRequest {
    /// Read a parsed JSON body, treating anything but an object as empty
    ///
    /// Arrays would otherwise fill the fields by position.
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Object(map) => serde_json::from_value(Value::Object(map)).unwrap_or_default(),
            _ => Self::default(),
        }
    }
}

/// How multiple images are produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Rely on the model's native sequential generation
    #[default]
    Batch,
    /// One independent upstream call per requested image
    Exact,
}

/// A validated generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub image: Option<Value>,
    pub size: Option<Value>,
    pub seed: Option<Number>,
    pub sequential_image_generation: Option<Value>,
    pub sequential_image_generation_options: Option<Value>,
    pub stream: Option<bool>,
    pub guidance_scale: Option<Number>,
    pub response_format: Option<Value>,
    pub watermark: Option<bool>,
    /// Requested image count, already clamped to the upstream hard limit
    pub images_count: u32,
    pub mode: Mode,
}

/// JSON body sent to the upstream generation endpoint
///
/// Optional fields are omitted when absent; the upstream treats an explicit
/// `null` differently from a missing key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamPayload {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequential_image_generation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequential_image_generation_options: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
    pub watermark: bool,
}

/// One generated image, forwarded as the upstream described it
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ImageItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Any other fields the upstream attached
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Marker occupying the slot of a failed upstream call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorItem {
    pub error: ErrorItemDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorItemDetails {
    /// Upstream HTTP status, as a string
    pub code: String,
    pub message: String,
}

/// Entry of the aggregated `data` array
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataItem {
    Image(ImageItem),
    Error(ErrorItem),
}

impl DataItem {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Aggregated token and image counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub generated_images: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

/// Response for exact-mode requests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResponse {
    pub model: String,
    /// Unix timestamp of when aggregation completed
    pub created: u64,
    pub data: Vec<DataItem>,
    pub usage: Usage,
}
