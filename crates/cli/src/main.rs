use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use tradehook_core::traits::BrokerGateway;
use tradehook_core::{AppConfig, ConfigLoader};
use tradehook_engine::OrderSequencer;
use tradehook_ib::{IbGateway, PaperGateway};
use tradehook_web_api::ApiServer;

#[derive(Parser)]
#[command(name = "tradehook")]
#[command(about = "Webhook-to-Interactive-Brokers order bridge", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to IB Gateway/TWS and serve the webhook
    Run {
        /// IB Gateway/TWS host
        #[arg(long, env = "TRADEHOOK_IB__HOST")]
        host: Option<String>,
        /// IB API port (7497 = TWS live, 4002 = gateway paper)
        #[arg(long, env = "TRADEHOOK_IB__PORT")]
        port: Option<u16>,
        /// IB client ID
        #[arg(long, env = "TRADEHOOK_IB__CLIENT_ID")]
        client_id: Option<i32>,
        /// Webhook listen address (host:port)
        #[arg(long)]
        listen: Option<String>,
    },
    /// Serve the webhook against an in-memory paper book, no IB needed
    Paper {
        /// Webhook listen address (host:port)
        #[arg(long)]
        listen: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ConfigLoader::load_from(&cli.config)?;

    match cli.command {
        Commands::Run {
            host,
            port,
            client_id,
            listen,
        } => {
            if let Some(host) = host {
                config.ib.host = host;
            }
            if let Some(port) = port {
                config.ib.port = port;
            }
            if let Some(client_id) = client_id {
                config.ib.client_id = client_id;
            }
            // Connection failure here is fatal; after startup every
            // failure is scoped to a single intent.
            let gateway = IbGateway::connect(config.ib.clone()).await?;
            serve(Arc::new(gateway), &config, listen).await
        }
        Commands::Paper { listen } => {
            tracing::info!("paper mode: orders fill against an in-memory book");
            serve(Arc::new(PaperGateway::new()), &config, listen).await
        }
    }
}

async fn serve(
    gateway: Arc<dyn BrokerGateway>,
    config: &AppConfig,
    listen: Option<String>,
) -> Result<()> {
    let sequencer = Arc::new(OrderSequencer::new(gateway, config.engine.clone()));
    let addr = listen.unwrap_or_else(|| config.server.listen_addr());
    ApiServer::new(sequencer).serve(&addr).await
}
