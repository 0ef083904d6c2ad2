use clap::{Parser, Subcommand};
use colored::Colorize;
use dotenv::dotenv;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use what2eat::api;
use what2eat::commands::score_cmd;
use what2eat::config::{ConfigError, ProviderConfig, ServerConfig};
use what2eat::providers::GeminiProvider;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Run the label analysis HTTP API
    Serve(ServeArgs),
    /// Compute the health score of a nutrition JSON file ("-" for stdin)
    Score {
        file: String,
        #[arg(long)]
        beverage: bool,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value = "3000")]
    port: u16,

    #[arg(long)]
    gemini_api_key: Option<String>,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            gemini_api_key: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Server error: {0}")]
    ServerError(String),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(serve) => run_api_server(serve).await?,
        Command::Score { file, beverage } => match score_cmd::handle_command(&file, beverage) {
            Ok(report) => println!("{}", report),
            Err(e) => {
                eprintln!("{}", format!("{:#}", e).red());
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

async fn run_api_server(args: ServeArgs) -> Result<(), AppError> {
    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|e| AppError::ServerError(format!("Invalid address: {}", e)))?;

    let provider_config = match args.gemini_api_key {
        Some(key) => ProviderConfig::from_lookup("gemini", |name| {
            if name == "GEMINI_API_KEY" {
                Some(key.clone())
            } else {
                std::env::var(name).ok()
            }
        })?,
        None => ProviderConfig::from_env("gemini")?,
    };
    let server_config = ServerConfig::from_env()?;

    let provider = GeminiProvider::new(provider_config)
        .map_err(|e| AppError::ProviderError(e.to_string()))?;

    let app = api::create_api(Arc::new(provider), server_config);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::ServerError(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("{} listening on {}", api::SERVICE_NAME, addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::ServerError(e.to_string()))?;

    Ok(())
}
