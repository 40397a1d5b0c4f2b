use crate::{config::AzureConfig, error::AppError};
use reqwest::{header::CONTENT_TYPE, Client};
use serde_json::{Map, Value};
use std::time::Duration;

/// Build the chat completions URL for one deployment.
///
/// URL pattern: `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={api_version}`
pub fn chat_completions_url(config: &AzureConfig, deployment: &str) -> String {
    format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        config.endpoint.trim_end_matches('/'),
        deployment,
        config.api_version
    )
}

/// Call Azure OpenAI Chat Completions for `deployment`.
///
/// Auth uses the `api-key` header (not Bearer). Non-streaming calls get the total
/// timeout. Streaming calls only bound the wait for response headers, so long
/// generations are not cut off once Azure starts answering.
/// Non-2xx answers are buffered and returned as [`AppError::BackendRejected`].
pub async fn chat_completions(
    client: &Client,
    config: &AzureConfig,
    deployment: &str,
    body: &Map<String, Value>,
    stream: bool,
) -> Result<reqwest::Response, AppError> {
    let url = chat_completions_url(config, deployment);

    let request = client
        .post(&url)
        .header("api-key", &config.api_key)
        .header(CONTENT_TYPE, "application/json")
        .json(body);

    let timeout = Duration::from_secs(config.timeout_seconds);
    let response = if stream {
        tokio::time::timeout(timeout, request.send())
            .await
            .map_err(|_| AppError::BackendTimedOut(timeout))??
    } else {
        request.timeout(timeout).send().await?
    };

    if !response.status().is_success() {
        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await?;
        return Err(AppError::BackendRejected {
            status,
            content_type,
            body,
        });
    }

    Ok(response)
}
