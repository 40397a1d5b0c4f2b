use anyhow::Result;
use azure_openai_proxy::config;
use colored::Colorize;
use std::path::Path;

/// Execute the config show command
///
/// Displays the effective configuration (file + environment) with secrets masked
pub fn show(config_path: &Path) -> Result<()> {
    println!("{}", "Loading configuration...".yellow());

    let cfg = config::load_config(config_path)?;

    println!("{}", "Current Configuration:".green().bold());
    println!();
    println!("{}", toml::to_string_pretty(&cfg.redacted())?);

    Ok(())
}
