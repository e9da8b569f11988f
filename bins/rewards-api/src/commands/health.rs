//! Health check command

use crate::output;
use crate::Format;
use anyhow::{ensure, Result};
use owo_colors::OwoColorize;
use rewards_api_client::ApiClient;

/// Probe the backend health endpoint
pub async fn run(client: &ApiClient, timing: bool, format: Format) -> Result<()> {
    let (response, elapsed) = client.timed_health_check().await;
    tracing::debug!(elapsed_ms = elapsed.as_secs_f64() * 1000.0, "Health probe finished");

    if format == Format::Json {
        output::print_json(&response)?;
    } else {
        let time_str = if timing {
            format!(" ({}ms)", elapsed.as_millis())
        } else {
            String::new()
        };
        match response.error() {
            None => println!("  Health:  {}{}", "✓ OK".green(), time_str.dimmed()),
            Some(error) => {
                println!("  Health:  {} {}{}", "✗".red(), error.red(), time_str.dimmed());
            }
        }
    }

    ensure!(response.is_success(), "backend is not healthy");
    Ok(())
}
