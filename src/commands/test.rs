use anyhow::Result;
use azure_openai_proxy::{config, providers::azure_openai};
use colored::Colorize;
use std::path::Path;

/// Execute the test command
///
/// This validates the configuration without starting the server
pub fn execute(config_path: &Path) -> Result<()> {
    println!("{}", "Testing configuration...".yellow());

    let cfg = config::load_config(config_path)?;

    println!("{}", "✓ Configuration test successful".green());
    println!();

    println!("{}", "Configuration Summary:".bold());
    println!("  {}: {}:{}", "Server".cyan(), cfg.server.host, cfg.server.port);
    println!(
        "  {}: {} ({})",
        "Logging".cyan(),
        cfg.server.log_level,
        cfg.server.log_format
    );
    println!(
        "  {}: {}",
        "Outbound URL".cyan(),
        azure_openai::chat_completions_url(&cfg.azure, "{deployment}")
    );
    println!(
        "  {}: {}",
        "Caller auth".cyan(),
        if cfg.auth.shared_secret.is_empty() {
            "empty shared secret (insecure)".red()
        } else {
            "shared secret set".green()
        }
    );
    println!();

    println!("  {}: {}", "Model Mappings".cyan(), cfg.models.len());
    for (model, deployment) in cfg.model_table() {
        println!("    {} → {}", model, deployment);
    }
    println!(
        "    {} → {}",
        "(default)".dimmed(),
        cfg.azure.default_deployment
    );
    if !cfg.azure.fallback_deployments.is_empty() {
        println!(
            "    {} → {}",
            "(on 404)".dimmed(),
            cfg.azure.fallback_deployments.join(", ")
        );
    }
    println!();

    println!(
        "  {}: {}",
        "Metrics".cyan(),
        if cfg.metrics.enabled {
            format!("enabled at {}", cfg.metrics.endpoint).green()
        } else {
            "disabled".red()
        }
    );

    Ok(())
}
