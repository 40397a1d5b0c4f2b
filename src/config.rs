use config::{builder::DefaultState, ConfigBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::logging::mask_secret;

/// Prefix for nested overrides, e.g. `AZURE_PROXY__AZURE__API_VERSION`
pub const ENV_PREFIX: &str = "AZURE_PROXY";

/// Flat variables understood for compatibility with plain `.env` deployments
const FLAT_ENV_VARS: &[(&str, &str)] = &[
    ("AZURE_OPENAI_ENDPOINT", "azure.endpoint"),
    ("AZURE_OPENAI_API_KEY", "azure.api_key"),
    ("AZURE_OPENAI_DEPLOYMENT", "azure.default_deployment"),
    ("AZURE_OPENAI_API_VERSION", "azure.api_version"),
    ("PRIVATE_PASSWORD", "auth.shared_secret"),
    ("PORT", "server.port"),
];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub azure: AzureConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Caller-facing model name -> Azure deployment name.
    /// A list rather than a table so model names keep their case.
    #[serde(default = "default_models")]
    pub models: Vec<ModelMapping>,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelMapping {
    pub name: String,
    pub deployment: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: String,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5005,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AzureConfig {
    /// Resource base URL, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    /// Used when the requested model has no mapping entry
    pub default_deployment: String,
    /// Tried in order when a deployment answers 404
    pub fallback_deployments: Vec<String>,
    /// Total timeout for non-streaming calls
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    /// Upper bound on concurrent outbound calls
    pub max_in_flight: usize,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            api_version: "2024-05-01-preview".to_string(),
            default_deployment: "Phi-4".to_string(),
            fallback_deployments: vec!["Phi-4".to_string()],
            timeout_seconds: 300,
            connect_timeout_seconds: 10,
            max_in_flight: 256,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Callers must send `Authorization: Bearer <shared_secret>`.
    /// An empty secret is accepted but leaves the proxy effectively open.
    pub shared_secret: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "/metrics".to_string(),
        }
    }
}

fn default_models() -> Vec<ModelMapping> {
    ["gpt-4.1-nano", "Phi-4"]
        .into_iter()
        .map(|name| ModelMapping {
            name: name.to_string(),
            deployment: name.to_string(),
        })
        .collect()
}

impl Config {
    /// Model mapping as a sorted lookup table; later entries win on duplicate names
    pub fn model_table(&self) -> BTreeMap<String, String> {
        self.models
            .iter()
            .map(|m| (m.name.clone(), m.deployment.clone()))
            .collect()
    }

    /// Copy of the configuration with every secret masked, for display
    pub fn redacted(&self) -> Config {
        let mut cfg = self.clone();
        cfg.azure.api_key = mask_secret(&cfg.azure.api_key);
        cfg.auth.shared_secret = mask_secret(&cfg.auth.shared_secret);
        cfg
    }
}

/// Load configuration from `path` (optional) and the process environment
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let builder = config::Config::builder().add_source(config::File::from(path).required(false));
    let env: HashMap<String, String> = std::env::vars().collect();

    build_config(builder, env)
}

/// Layer environment overrides on top of `builder`, then deserialize and validate.
///
/// Precedence, lowest first: struct defaults, sources already on `builder`,
/// `AZURE_PROXY__*` variables, then the flat `AZURE_OPENAI_*` / `PRIVATE_PASSWORD` / `PORT` variables.
pub fn build_config(
    builder: ConfigBuilder<DefaultState>,
    env: HashMap<String, String>,
) -> anyhow::Result<Config> {
    let mut builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(Some(env.clone())),
    );

    for (var, key) in FLAT_ENV_VARS {
        builder = builder.set_override_option(*key, env.get(*var).cloned())?;
    }

    let cfg: Config = builder.build()?.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.azure.endpoint.trim().is_empty() {
        anyhow::bail!(
            "Missing required configuration: AZURE_OPENAI_ENDPOINT (azure.endpoint)"
        );
    }

    if cfg.azure.api_key.trim().is_empty() {
        anyhow::bail!("Missing required configuration: AZURE_OPENAI_API_KEY (azure.api_key)");
    }

    if cfg.azure.default_deployment.trim().is_empty() {
        anyhow::bail!("azure.default_deployment cannot be empty");
    }

    if cfg.azure.max_in_flight == 0 {
        anyhow::bail!("azure.max_in_flight must be at least 1");
    }

    for mapping in &cfg.models {
        if mapping.name.is_empty() {
            anyhow::bail!("Model mapping entries need a non-empty name");
        }
        if mapping.deployment.trim().is_empty() {
            anyhow::bail!("Model '{}' maps to an empty deployment name", mapping.name);
        }
    }

    match cfg.server.log_format.as_str() {
        "text" | "json" => {}
        other => anyhow::bail!("Invalid log format '{}': expected 'text' or 'json'", other),
    }

    if cfg.metrics.enabled && !cfg.metrics.endpoint.starts_with('/') {
        anyhow::bail!("metrics.endpoint must start with '/'");
    }

    Ok(())
}
