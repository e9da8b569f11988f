//! Print the resolved client configuration

use crate::Format;
use anyhow::Result;
use owo_colors::OwoColorize;
use rewards_api_client::ClientConfig;

/// Show where requests would go and with which timeout
pub fn run(config: &ClientConfig, format: Format) -> Result<()> {
    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("  {}  {}", "Base URL:".bold(), config.base_url);
    println!("  {}   {}ms", "Timeout:".bold(), config.timeout.as_millis());
    println!("  {}     {}", "Agent:".bold(), config.user_agent.dimmed());
    Ok(())
}
