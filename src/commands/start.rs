use anyhow::{Context, Result};
use azure_openai_proxy::{config, init_tracing, server};
use colored::Colorize;
use std::path::Path;
use tracing::info;

/// Execute the start command
///
/// This will:
/// 1. Load and validate configuration (a failure exits the process with status 1)
/// 2. Initialize tracing from the configured level and format
/// 3. Start the server
pub async fn execute(config_path: &Path) -> Result<()> {
    let cfg = config::load_config(config_path).context("Refusing to start")?;

    init_tracing(&cfg.server);
    println!("{}", "Starting Azure OpenAI proxy...".green());
    info!(config = %config_path.display(), "Configuration loaded");

    // Blocks until shutdown
    server::start_server(cfg).await?;

    Ok(())
}
