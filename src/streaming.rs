use crate::error::AppError;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, StatusCode},
    response::Response,
};
use futures::stream::StreamExt;

/// Relay a streaming Azure response to the caller without buffering it.
///
/// The backend `content-type` is copied over and each chunk is forwarded as soon
/// as it arrives. `guard` lives as long as the body stream, so anything it holds
/// (an in-flight permit) is released only once the relay ends.
pub fn passthrough<G>(response: reqwest::Response, guard: G) -> Result<Response, AppError>
where
    G: Send + Sync + 'static,
{
    let content_type = response.headers().get(CONTENT_TYPE).cloned();

    let stream = response.bytes_stream().map(move |chunk| {
        let _guard = &guard;
        chunk.inspect_err(|e| tracing::error!("Stream error: {}", e))
    });

    let mut builder = Response::builder().status(StatusCode::OK);
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }

    builder
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(format!("Failed to build streaming response: {}", e)))
}
