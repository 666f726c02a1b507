use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Errors that fail a whole generation request
///
/// Failures of individual fan-out calls are not represented here; they are
/// folded into the aggregated response instead.
#[derive(Debug, Error)]
pub enum ImageGenError {
    /// Required fields missing or the body could not be read
    #[error("{0}")]
    InvalidRequest(String),

    /// Request body exceeds the configured size limit
    #[error("{0}")]
    PayloadTooLarge(String),

    /// No upstream API key configured on the server
    #[error("Missing ARK_API_KEY in server environment")]
    MissingApiKey,

    /// The upstream could not be reached or did not answer in time
    #[error("{0}")]
    Connection(String),
}

impl ImageGenError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::MissingApiKey => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Connection(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string for the response
    pub fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) | Self::PayloadTooLarge(_) => "invalid_request_error",
            Self::MissingApiKey => "configuration_error",
            Self::Connection(_) => "api_error",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    message: String,
    r#type: String,
}

impl IntoResponse for ImageGenError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = ErrorResponse {
            error: ErrorDetails {
                message: self.to_string(),
                r#type: self.error_type().to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
