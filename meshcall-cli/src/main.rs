mod console;
mod join;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use meshcall::relay::RelayConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshcall")]
#[command(bin_name = "meshcall")]
#[command(about = "Mesh audio/video calls over a room signaling relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a room and print its events. Lines typed on stdin are sent as chat.
    Join(join::JoinArgs),

    /// Run the reference signaling relay.
    Relay {
        /// Address to listen on [env: MESHCALL_RELAY_ADDR]
        #[arg(long)]
        bind: Option<String>,

        /// Mount point of the room sockets [env: MESHCALL_WS_PATH]
        #[arg(long)]
        ws_path: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Join(args) => join::run(args).await,
        Commands::Relay { bind, ws_path } => {
            let env = RelayConfig::from_env().context("Invalid relay environment")?;
            let bind = bind.unwrap_or_else(|| env.bind_addr.to_string());
            let ws_path = ws_path.unwrap_or(env.ws_path);
            let config = RelayConfig::new(&bind, &ws_path)?;

            println!(
                "{} {}",
                "Relay listening on".green().bold(),
                format!("ws://{}/{}/{{room}}/{{client}}", config.bind_addr, config.ws_path).cyan()
            );
            meshcall::relay::run(config).await?;
            Ok(())
        }
    }
}
