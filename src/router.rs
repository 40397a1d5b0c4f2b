use crate::config::Config;
use std::collections::BTreeMap;

/// Route information for one chat completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// The `model` value the caller sent, if any
    pub requested_model: Option<String>,
    /// Deployment chosen for the first attempt
    pub deployment: String,
    /// Whether the default deployment was substituted for an unmapped model
    pub used_default: bool,
}

/// Maps caller-facing model names to Azure deployments.
///
/// Built once from the startup configuration and never mutated.
#[derive(Debug, Clone)]
pub struct ModelRouter {
    models: BTreeMap<String, String>,
    default_deployment: String,
    fallback_deployments: Vec<String>,
}

impl ModelRouter {
    pub fn new(config: &Config) -> Self {
        Self {
            models: config.model_table(),
            default_deployment: config.azure.default_deployment.clone(),
            fallback_deployments: config.azure.fallback_deployments.clone(),
        }
    }

    /// Resolve a requested model name to the deployment for the first attempt
    pub fn route(&self, model: Option<&str>) -> RouteInfo {
        if let Some(deployment) = model.and_then(|m| self.models.get(m)) {
            return RouteInfo {
                requested_model: model.map(str::to_string),
                deployment: deployment.clone(),
                used_default: false,
            };
        }

        tracing::warn!(
            requested_model = model.unwrap_or("<none>"),
            default_deployment = %self.default_deployment,
            "Model not found in mapping, using default deployment"
        );

        RouteInfo {
            requested_model: model.map(str::to_string),
            deployment: self.default_deployment.clone(),
            used_default: true,
        }
    }

    /// Deployments to try in order: the routed one, then each fallback, without repeats
    pub fn candidates(&self, route: &RouteInfo) -> Vec<String> {
        let mut candidates = vec![route.deployment.clone()];
        for fallback in &self.fallback_deployments {
            if !candidates.contains(fallback) {
                candidates.push(fallback.clone());
            }
        }
        candidates
    }

    /// Caller-facing model names, sorted
    pub fn available_models(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }
}
