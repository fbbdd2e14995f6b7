//! Warden CLI binary.
//!
//! - `warden run` connects to Telegram and moderates until Ctrl+C
//! - `warden check-config` validates the layered configuration

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use warden::cli::{Cli, Commands};
use warden::observability::init_logging;
use warden_bot::{BotConfig, BotServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = BotConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&redacted(&config))?);
            println!("Configuration OK");
        }
        Commands::Run => {
            init_logging(config.logging(), cli.verbose)?;

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("Shutdown requested");
                        let _ = shutdown_tx.send(true);
                    }
                    Err(e) => {
                        error!(error = %e, "Cannot listen for Ctrl+C");
                        // Dropping the sender would stop the poller.
                        std::future::pending::<()>().await;
                        drop(shutdown_tx);
                    }
                }
            });

            BotServer::new(config).run(shutdown_rx).await?;
        }
    }

    Ok(())
}

/// Configuration as JSON with the token masked.
fn redacted(config: &BotConfig) -> serde_json::Value {
    let mut value = serde_json::to_value(config).unwrap_or_default();
    if let Some(token) = value.pointer_mut("/telegram/token") {
        *token = serde_json::Value::String("<redacted>".to_string());
    }
    value
}
