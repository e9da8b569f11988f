//! Rewards API CLI - backend connectivity probe
//!
//! Calls the rewards backend through the shared API client and prints the
//! response envelope, for checking environments and reproducing API issues.

use clap::{Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use rewards_api_client::{ApiClient, ClientConfig};
use rewards_telemetry::{LogFormat, TelemetryConfig};
use std::process::ExitCode;
use std::time::Duration;

mod commands;
mod output;

use commands::request::{self, Verb};
use commands::{config, health};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable, colored
    Text,
    /// The envelope as JSON
    Json,
}

/// Command-line probe for the rewards backend API
#[derive(Parser)]
#[command(name = "rewards-api")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Base URL including the /api prefix (defaults to EXPO_PUBLIC_API_URL, then API_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bearer token sent as the Authorization header
    #[arg(long, global = true, env = "REWARDS_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the /health endpoint beside the API namespace
    Health {
        /// Show response time
        #[arg(short, long)]
        timing: bool,
    },

    /// GET an endpoint
    Get {
        /// Endpoint path with leading slash, e.g. /offers
        endpoint: String,

        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "query", value_parser = request::parse_key_value)]
        query: Vec<(String, String)>,
    },

    /// POST a JSON body to an endpoint
    Post {
        /// Endpoint path with leading slash
        endpoint: String,

        /// JSON body
        #[arg(short, long)]
        data: Option<String>,
    },

    /// PUT a JSON body to an endpoint
    Put {
        /// Endpoint path with leading slash
        endpoint: String,

        /// JSON body
        #[arg(short, long)]
        data: Option<String>,
    },

    /// PATCH a JSON body to an endpoint
    Patch {
        /// Endpoint path with leading slash
        endpoint: String,

        /// JSON body
        #[arg(short, long)]
        data: Option<String>,
    },

    /// DELETE an endpoint
    Delete {
        /// Endpoint path with leading slash
        endpoint: String,
    },

    /// Upload a file as multipart form data
    Upload {
        /// Endpoint path with leading slash
        endpoint: String,

        /// File to upload
        #[arg(long)]
        file: std::path::PathBuf,

        /// Form field name
        #[arg(long, default_value = "file")]
        field: String,
    },

    /// Print the resolved client configuration
    Config,
}

impl Cli {
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = ClientConfig::from_env()?;
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        config.validate()?;
        Ok(config)
    }

    fn client(&self) -> anyhow::Result<ApiClient> {
        let client = ApiClient::with_config(self.client_config()?)?;
        if let Some(token) = &self.token {
            client.set_auth_token(Some(token));
        }
        Ok(client)
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;

    match &cli.command {
        Commands::Config => config::run(&cli.client_config()?, format),
        Commands::Health { timing } => health::run(&cli.client()?, *timing, format).await,
        Commands::Get { endpoint, query } => {
            request::get(&cli.client()?, endpoint, query, format).await
        }
        Commands::Post { endpoint, data } => {
            let client = cli.client()?;
            request::send(&client, Verb::Post, endpoint, data.as_deref(), format).await
        }
        Commands::Put { endpoint, data } => {
            let client = cli.client()?;
            request::send(&client, Verb::Put, endpoint, data.as_deref(), format).await
        }
        Commands::Patch { endpoint, data } => {
            let client = cli.client()?;
            request::send(&client, Verb::Patch, endpoint, data.as_deref(), format).await
        }
        Commands::Delete { endpoint } => request::delete(&cli.client()?, endpoint, format).await,
        Commands::Upload { endpoint, file, field } => {
            request::upload(&cli.client()?, endpoint, file, field, format).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = if cli.verbose {
        TelemetryConfig::verbose()
    } else {
        TelemetryConfig::default()
    };
    let log_format = match cli.format {
        Format::Json => LogFormat::Json,
        Format::Text => LogFormat::Compact,
    };
    if let Err(e) = rewards_telemetry::init_with_config(&telemetry.with_format(log_format)) {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
