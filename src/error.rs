use axum::{
    body::Bytes,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::metrics;

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
pub const UNREACHABLE_MESSAGE: &str = "Failed to connect to Azure OpenAI Service.";
pub const INTERNAL_MESSAGE: &str = "An internal server error occurred.";

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Caller token missing or not equal to the shared secret
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Azure answered with a non-2xx status; relayed to the caller as-is
    #[error("Azure OpenAI rejected the request with status {status}")]
    BackendRejected {
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: Bytes,
    },

    /// No usable response from Azure (DNS, refused connection, transport timeout, broken body)
    #[error("Failed to connect to Azure OpenAI Service: {0}")]
    BackendUnreachable(#[source] reqwest::Error),

    /// Azure accepted the connection but sent no response headers in time
    #[error("Azure OpenAI did not respond within {0:?}")]
    BackendTimedOut(std::time::Duration),

    /// Any other local failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::BackendRejected { .. } => "backend_rejected",
            Self::BackendUnreachable(_) => "backend_unreachable",
            Self::BackendTimedOut(_) => "backend_timeout",
            Self::Internal(_) => "internal_error",
        }
    }

    /// True when Azure reported that the deployment does not exist
    pub fn is_backend_not_found(&self) -> bool {
        matches!(self, Self::BackendRejected { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        metrics::record_error(self.kind());

        match self {
            Self::Unauthorized(reason) => {
                tracing::warn!(reason = %reason, "Rejected unauthorized request");
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": UNAUTHORIZED_MESSAGE })),
                )
                    .into_response()
            }
            Self::BackendRejected {
                status,
                content_type,
                body,
            } => {
                tracing::warn!(
                    status = status.as_u16(),
                    body = %String::from_utf8_lossy(&body),
                    "Azure OpenAI returned an error, relaying it"
                );
                let mut response = (status, body).into_response();
                if let Some(content_type) = content_type {
                    response
                        .headers_mut()
                        .insert(header::CONTENT_TYPE, content_type);
                }
                response
            }
            Self::BackendUnreachable(err) => {
                tracing::error!(error = %err, "Failed to reach Azure OpenAI Service");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": UNREACHABLE_MESSAGE })),
                )
                    .into_response()
            }
            Self::BackendTimedOut(waited) => {
                tracing::error!(
                    waited_ms = waited.as_millis(),
                    "Azure OpenAI response headers timed out"
                );
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": UNREACHABLE_MESSAGE })),
                )
                    .into_response()
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "An unexpected error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": INTERNAL_MESSAGE })),
                )
                    .into_response()
            }
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        // A builder error means we never got as far as the network
        if err.is_builder() {
            Self::Internal(format!("Failed to build outbound request: {}", err))
        } else {
            Self::BackendUnreachable(err)
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {}", err))
    }
}
