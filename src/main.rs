mod comms;
mod config;
mod errors;
mod monitor;
mod registry;
mod rotation;
mod token;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use registry::SessionRegistry;

#[derive(Parser)]
#[command(name = "authgate", version, about = "JWT session rotation service")]
struct AppCli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Remove every live session for an identity
    Purge { guid: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::logging::init();

    let mut config = config::Config::from_env()?;

    match AppCli::parse().command {
        Some(Commands::Purge { guid }) => {
            let url = config
                .database_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set for purge"))?;
            let registry = registry::PgRegistry::connect(&url).await?;
            let removed = registry.delete_all(guid).await?;
            info!(%guid, removed, "sessions purged");
            registry.close().await;
        }
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.port = port;
            }
            comms::http_api::serve(config).await?;
        }
        None => comms::http_api::serve(config).await?,
    }

    Ok(())
}
