mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use chain_data_gateway::api::{self, AppState};
use chain_data_gateway::config::Config;
use chain_data_gateway::eth::EthClient;
use chain_data_gateway::gateway::{Gateway, GatewaySettings};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    let client = EthClient::new(
        &config.chain_rpc_url,
        config.pending_feed_url.clone(),
        config.chain_id,
        config.upstream_timeout,
    )?;
    let mut settings = GatewaySettings::from(&config);

    match cli.command {
        Commands::Serve { addr } => {
            let bind = addr.unwrap_or_else(|| config.http_bind_addr.clone());
            let state = AppState {
                gateway: Gateway::new(Arc::new(client), settings),
                allowed_origins: config.allowed_origins.clone(),
            };
            api::run_http_server(&bind, state).await?;
        }
        Commands::Scan { window, with_txs } => {
            if let Some(window) = window {
                anyhow::ensure!(window > 0, "--window must be greater than zero");
                settings.scan_window = window;
            }
            let gateway = Gateway::new(Arc::new(client), settings);
            let scan = gateway.scan(with_txs).await.context("scan failed")?;
            tracing::info!(
                tip = scan.tip,
                blocks = scan.blocks.len(),
                transactions = scan.transaction_count(),
                "scan complete"
            );
            print_json(&scan)?;
        }
        Commands::Feed => {
            let gateway = Gateway::new(Arc::new(client), settings);
            let feed = gateway.feed().await.context("failed to build feed")?;
            print_json(&feed)?;
        }
        Commands::Stats => {
            let gateway = Gateway::new(Arc::new(client), settings);
            let stats = gateway.stats().await.context("failed to compute stats")?;
            print_json(&stats)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{out}");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}
