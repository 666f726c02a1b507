use std::future::Future;
use std::time::{SystemTime, UNIX_EPOCH};

use http::StatusCode;
use serde_json::Value;
use tracing::Instrument;

use crate::{
    error::ImageGenError,
    types::{AggregateResponse, DataItem, ErrorItem, ErrorItemDetails, ImageItem, Usage},
    upstream::UpstreamReply,
};

/// Outcome of one upstream call in a fan-out
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamResult {
    Success {
        images: Vec<ImageItem>,
        output_tokens: u64,
        /// Image count reported by the upstream, if any
        generated_images: Option<u64>,
    },
    Failure {
        status_code: u16,
        message: String,
    },
}

impl UpstreamResult {
    /// Failure used when a call never produced an HTTP response
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self::Failure {
            status_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: message.into(),
        }
    }

    /// Classify a raw upstream answer
    pub fn from_reply(reply: Result<UpstreamReply, ImageGenError>) -> Self {
        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => return Self::transport_failure(e.to_string()),
        };

        let body: Value = serde_json::from_slice(&reply.body).unwrap_or(Value::Null);

        if !reply.status.is_success() {
            let message = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map_or_else(
                    || format!("Request failed with status code {}", reply.status.as_u16()),
                    ToString::to_string,
                );

            return Self::Failure {
                status_code: reply.status.as_u16(),
                message,
            };
        }

        let images = body
            .get("data")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value::<ImageItem>(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Self::Success {
            images,
            output_tokens: body.pointer("/usage/output_tokens").and_then(as_count).unwrap_or(0),
            generated_images: body
                .pointer("/usage/generated_images")
                .and_then(as_count)
                .filter(|count| *count > 0),
        }
    }
}

/// Run `count` calls concurrently and collect their results in call order
///
/// Every call runs to completion regardless of how the others fare; the
/// result vector has exactly `count` entries and entry `i` belongs to call
/// `i`. Calls are spawned as detached tasks inside the caller's span, so
/// dropping the returned future does not cancel calls already in flight.
///
/// A call that panics leaves a 500 failure in its slot. This needs the
/// unwinding panic strategy; release builds abort on panic instead.
pub async fn fan_out<F, Fut>(count: usize, call: F) -> Vec<UpstreamResult>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = UpstreamResult> + Send + 'static,
{
    let handles: Vec<_> = (0..count)
        .map(|index| tokio::spawn(call(index).instrument(tracing::Span::current())))
        .collect();

    let mut slots = Vec::with_capacity(count);

    for (index, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap_or_else(|e| {
            tracing::error!(index, error = %e, "fan-out call did not complete");
            UpstreamResult::transport_failure("request failed")
        });
        slots.push(result);
    }

    slots
}

/// Merge per-call results into the response envelope
pub fn aggregate(model: String, results: Vec<UpstreamResult>) -> AggregateResponse {
    let mut data = Vec::new();
    let mut usage = Usage::default();

    for result in results {
        match result {
            UpstreamResult::Success {
                images,
                output_tokens,
                generated_images,
            } => {
                usage.generated_images += generated_images.unwrap_or(images.len() as u64);
                usage.output_tokens += output_tokens;
                data.extend(images.into_iter().map(DataItem::Image));
            }
            UpstreamResult::Failure { status_code, message } => {
                data.push(DataItem::Error(ErrorItem {
                    error: ErrorItemDetails {
                        code: status_code.to_string(),
                        message,
                    },
                }));
            }
        }
    }

    usage.total_tokens = usage.output_tokens;

    AggregateResponse {
        model,
        created: unix_now(),
        data,
        usage,
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

/// Non-negative integer from a JSON number or numeric string
fn as_count(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = n.trunc() as u64;
    (n.is_finite() && n > 0.0).then_some(count)
}
