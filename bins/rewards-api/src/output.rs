//! Envelope printing shared by all commands

use anyhow::Result;
use owo_colors::OwoColorize;
use rewards_api_client::ApiResponse;
use serde_json::Value;

/// Print the envelope in its wire shape
pub fn print_json(response: &ApiResponse<Value>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

/// Print the envelope for a human
pub fn print_text(response: &ApiResponse<Value>) -> Result<()> {
    match response {
        ApiResponse::Success { data, message } => {
            print!("{}", "✓ Success".green().bold());
            if let Some(message) = message {
                print!("  {}", message.dimmed());
            }
            println!();
            if let Some(data) = data {
                println!("{}", serde_json::to_string_pretty(data)?);
            }
        }
        ApiResponse::Failure { error, errors } => {
            println!("{} {}", "✗".red().bold(), error.red());
            for (field, messages) in errors.iter().flatten() {
                for message in messages {
                    println!("    └─ {}: {}", field.yellow(), message);
                }
            }
        }
    }
    Ok(())
}
