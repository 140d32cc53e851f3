use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use sheet_sync::config::proc_loader;
use sheet_sync::server;
use sheet_sync::sinks::{AppendClient, AppendOutcome, Row};
use sheet_sync::utils::logging;
use sheet_sync::utils::logging::LogLevel;
use sheet_sync::ServiceConfig;
use tokio::io::AsyncReadExt;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML config; without it everything is read from the environment
    #[arg(short, long, env = "CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append one batch of rows and print the outcome as JSON
    Append {
        #[arg(short, long)]
        destination: String,
        /// JSON array of rows, e.g. '[["2024-01-01", "Win", 3]]'; stdin when omitted
        #[arg(short, long)]
        rows: Option<String>,
    },
    /// Run the local sync sidecar
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // -------------------------------
    // 1. Load config
    // -------------------------------

    let service_config = load_config(args.config.as_ref()).await?;
    logging::run(&service_config, args.log_level.to_owned());

    // -------------------------------
    // 2. Build append client (owns the token cache)
    // -------------------------------

    let append_client = Arc::new(AppendClient::from_config(&service_config)?);

    // -------------------------------
    // 3. Run command
    // -------------------------------

    match args.command {
        Command::Append { destination, rows } => {
            let rows = read_rows(rows).await?;
            let outcome = append_client.append(&destination, rows).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if let AppendOutcome::Failed { error, .. } = outcome {
                return Err(anyhow!(error));
            }
        }
        Command::Serve => {
            info!("Service starting...");
            server::server::start(&service_config.settings, append_client).await?;
        }
    }

    Ok(())
}

async fn load_config(path: Option<&PathBuf>) -> Result<ServiceConfig> {
    match path {
        Some(path) => proc_loader::file_to_config(path).await,
        None => proc_loader::env_to_config().await,
    }
}

async fn read_rows(rows: Option<String>) -> Result<Vec<Row>> {
    let raw = match rows {
        Some(raw) => raw,
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("reading rows from stdin")?;
            raw
        }
    };
    serde_json::from_str(&raw).context("rows must be a JSON array of arrays")
}
