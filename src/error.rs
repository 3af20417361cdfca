//! Error types for the segmentation proxy
//!
//! Provides unified error handling using thiserror. Every variant maps to a
//! status code and a stable `kind` string in the JSON error body.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Gateway Error Enum ==
/// Unified error type for the proxy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// No event given and the free-text query cannot stand in for one
    #[error("Please specify an event, e.g. event=sign_up_success")]
    EventRequired,

    /// Event is not in the configured allow-list
    #[error("Unknown event '{event}'. Allowed (sample): {allowed_sample:?}")]
    UnknownEvent {
        event: String,
        allowed_sample: Vec<String>,
    },

    /// Malformed request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream answered with HTTP 429
    #[error("Upstream rate limit hit. Please retry shortly.")]
    RateLimited,

    /// Upstream answered with any other status >= 400
    #[error("Upstream error: {body}")]
    Upstream { status: u16, body: String },

    /// Network failure or timeout talking to upstream
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    /// Upstream answered 2xx with a body that is not JSON
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    // == Kind ==
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::EventRequired => "event_required",
            GatewayError::UnknownEvent { .. } => "unknown_event",
            GatewayError::InvalidRequest(_) => "invalid_request",
            GatewayError::RateLimited => "rate_limited",
            GatewayError::Upstream { .. } => "upstream_error",
            GatewayError::Unavailable(_) => "upstream_unavailable",
            GatewayError::InvalidResponse(_) => "invalid_upstream_response",
            GatewayError::Internal(_) => "internal",
        }
    }

    // == Status Code ==
    /// HTTP status returned to the caller for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::EventRequired
            | GatewayError::UnknownEvent { .. }
            | GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GatewayError::Unavailable(_) | GatewayError::InvalidResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether a caller may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimited | GatewayError::Unavailable(_)
        )
    }
}

// == Body Rejections ==
/// Malformed or mistyped JSON bodies are client errors like any other.
impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::new(self.to_string(), self.kind()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the proxy.
pub type Result<T> = std::result::Result<T, GatewayError>;
