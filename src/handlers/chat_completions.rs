use crate::{
    config::Config,
    error::AppError,
    metrics,
    providers::azure_openai,
    router::{ModelRouter, RouteInfo},
    streaming,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::de::IgnoredAny;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub router: Arc<ModelRouter>,
    pub http_client: reqwest::Client,
    /// Bounds the number of concurrent outbound calls, streamed bodies included
    pub in_flight: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.azure.connect_timeout_seconds))
            .build()?;

        Ok(Self {
            router: Arc::new(ModelRouter::new(&config)),
            in_flight: Arc::new(Semaphore::new(config.azure.max_in_flight)),
            http_client,
            config,
        })
    }
}

/// Handle /v1/chat/completions endpoint.
///
/// The body is treated as opaque JSON: only `model` is rewritten to the chosen
/// deployment and `stream` decides between a buffered and a passthrough response.
/// Key order and number precision survive the rewrite, and a buffered answer is
/// relayed with the exact bytes Azure sent.
pub async fn handle_chat_completions(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let start = Instant::now();

    let Value::Object(request) = serde_json::from_slice::<Value>(&body)? else {
        return Err(AppError::Internal(
            "Request body is not a JSON object".to_string(),
        ));
    };

    let is_stream = request
        .get("stream")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let route = state
        .router
        .route(request.get("model").and_then(Value::as_str));

    tracing::info!(
        model = route.requested_model.as_deref().unwrap_or("<none>"),
        deployment = %route.deployment,
        stream = is_stream,
        "Handling chat completion request"
    );
    metrics::record_request(&route.deployment, is_stream, route.used_default);

    let permit = state
        .in_flight
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| AppError::Internal(format!("In-flight limiter closed: {}", e)))?;

    let (deployment, response) = send_with_fallback(&state, &route, request, is_stream).await?;
    metrics::record_duration(&deployment, is_stream, start.elapsed());

    if is_stream {
        tracing::debug!(deployment = %deployment, "Streaming response from Azure OpenAI");
        return streaming::passthrough(response, permit);
    }

    let bytes = response.bytes().await?;
    drop(permit);
    serde_json::from_slice::<IgnoredAny>(&bytes)?;

    tracing::info!(
        deployment = %deployment,
        duration_ms = start.elapsed().as_millis(),
        "Completed chat completion request"
    );

    Ok((
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
        bytes,
    )
        .into_response())
}

/// Try each candidate deployment in order, moving on only when Azure answers 404.
///
/// Returns the deployment that produced the response. When every candidate is
/// missing, the last 404 is returned so it gets relayed like any other rejection.
async fn send_with_fallback(
    state: &AppState,
    route: &RouteInfo,
    mut body: Map<String, Value>,
    is_stream: bool,
) -> Result<(String, reqwest::Response), AppError> {
    let candidates = state.router.candidates(route);
    let mut last_error = None;

    for (attempt, deployment) in candidates.iter().enumerate() {
        if attempt > 0 {
            let previous = &candidates[attempt - 1];
            tracing::warn!(
                from = %previous,
                to = %deployment,
                "Deployment not found, retrying with fallback deployment"
            );
            metrics::record_fallback(previous, deployment);
        }

        body.insert("model".to_string(), Value::String(deployment.clone()));

        match azure_openai::chat_completions(
            &state.http_client,
            &state.config.azure,
            deployment,
            &body,
            is_stream,
        )
        .await
        {
            Err(err) if err.is_backend_not_found() => last_error = Some(err),
            result => return result.map(|response| (deployment.clone(), response)),
        }
    }

    Err(last_error.unwrap_or_else(|| AppError::Internal("No deployment candidates".to_string())))
}
