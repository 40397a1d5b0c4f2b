use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::handlers::chat_completions::AppState;

/// Placeholder creation timestamp reported for every model
pub const MODEL_CREATED: u64 = 1686935002;
pub const MODEL_OWNER: &str = "azure-openai";

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub object: String,
    pub data: Vec<ModelObject>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelObject {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub owned_by: String,
}

/// Handle /v1/models endpoint.
/// Lists the caller-facing model names from the static mapping; no auth, always 200.
pub async fn list_models(State(state): State<AppState>) -> impl IntoResponse {
    let data = state
        .router
        .available_models()
        .map(|id| ModelObject {
            id: id.to_string(),
            object: "model".to_string(),
            created: MODEL_CREATED,
            owned_by: MODEL_OWNER.to_string(),
        })
        .collect();

    Json(ModelsResponse {
        object: "list".to_string(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, AzureConfig, Config, MetricsConfig, ModelMapping, ServerConfig};
    use std::sync::Arc;

    fn create_test_state() -> AppState {
        let config = Config {
            server: ServerConfig::default(),
            azure: AzureConfig {
                endpoint: "https://example.openai.azure.com".to_string(),
                api_key: "azure-key".to_string(),
                ..AzureConfig::default()
            },
            auth: AuthConfig::default(),
            models: vec![
                ModelMapping {
                    name: "gpt-4.1-nano".to_string(),
                    deployment: "gpt-4.1-nano".to_string(),
                },
                ModelMapping {
                    name: "Phi-4".to_string(),
                    deployment: "Phi-4".to_string(),
                },
            ],
            metrics: MetricsConfig::default(),
        };

        AppState::new(Arc::new(config)).unwrap()
    }

    #[tokio::test]
    async fn test_list_models() {
        let state = create_test_state();
        let response = list_models(State(state)).await.into_response();

        assert_eq!(response.status(), 200);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ModelsResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.object, "list");
        let ids: Vec<&str> = body.data.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["Phi-4", "gpt-4.1-nano"]);
        assert!(body
            .data
            .iter()
            .all(|m| m.created == MODEL_CREATED && m.owned_by == MODEL_OWNER));
    }
}
