use std::sync::Arc;
use std::time::Duration;

use ethers_core::types::{Address, U256};
use tracing::warn;

use crate::chain::{bounded, ChainClient, ChainError};
use crate::config::Config;
use crate::dedup;
use crate::models::{BlockRecord, ChartPoint, Scan, Stats, TransactionRecord};
use crate::normalize::{display_date, format_units, Normalizer, TxSource};
use crate::rpc::RpcShim;
use crate::scan_stats::SCAN_STATS;
use crate::scanner::BlockWindowScanner;
use crate::stats::compute_stats;

/// Knobs that vary between deployments of the gateway.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub scan_window: u64,
    pub scan_concurrency: usize,
    pub upstream_timeout: Duration,
    pub send_timeout: Duration,
    pub chain_id: u64,
    pub network_id: u64,
    pub native_symbol: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            scan_window: 10,
            scan_concurrency: 1,
            upstream_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(120),
            chain_id: 9999,
            network_id: 9999,
            native_symbol: "IFC".to_string(),
        }
    }
}

impl From<&Config> for GatewaySettings {
    fn from(config: &Config) -> Self {
        Self {
            scan_window: config.scan_window,
            scan_concurrency: config.scan_concurrency,
            upstream_timeout: config.upstream_timeout,
            send_timeout: config.send_timeout,
            chain_id: config.chain_id,
            network_id: config.network_id,
            native_symbol: config.native_symbol.clone(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub tip: u64,
    pub chain_id: u64,
    pub scan: crate::scan_stats::ScanSnapshot,
}

/// Read-side aggregation over one injected chain client.
#[derive(Clone)]
pub struct Gateway {
    client: Arc<dyn ChainClient>,
    scanner: BlockWindowScanner,
    normalizer: Normalizer,
    rpc: RpcShim,
    settings: GatewaySettings,
}

impl Gateway {
    pub fn new(client: Arc<dyn ChainClient>, settings: GatewaySettings) -> Self {
        let normalizer = Normalizer::new(settings.native_symbol.clone());
        let scanner = BlockWindowScanner::new(
            client.clone(),
            normalizer.clone(),
            settings.upstream_timeout,
            settings.scan_concurrency,
        );
        let rpc = RpcShim::new(
            client.clone(),
            settings.upstream_timeout,
            settings.chain_id,
            settings.network_id,
        );
        Self {
            client,
            scanner,
            normalizer,
            rpc,
            settings,
        }
    }

    pub fn rpc(&self) -> &RpcShim {
        &self.rpc
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub async fn scan(&self, with_transactions: bool) -> Result<Scan, ChainError> {
        self.scanner
            .scan(self.settings.scan_window, with_transactions)
            .await
    }

    /// Confirmed transactions in the window, newest block first.
    pub async fn transaction_details(&self) -> Result<Vec<TransactionRecord>, ChainError> {
        Ok(self.scan(true).await?.transactions())
    }

    /// Per-block transaction counts for the chart feed.
    pub async fn chart(&self) -> Result<Vec<ChartPoint>, ChainError> {
        let scan = self.scan(false).await?;
        Ok(scan
            .blocks
            .iter()
            .map(|b| ChartPoint {
                block: b.height,
                date: display_date(b.timestamp).unwrap_or_default(),
                count: b.transactions.len(),
            })
            .collect())
    }

    /// Confirmed window merged with the pending set, confirmed first.
    pub async fn feed(&self) -> Result<Vec<TransactionRecord>, ChainError> {
        let confirmed = self.transaction_details().await?;
        let pending = bounded(
            self.settings.upstream_timeout,
            self.client.pending_transactions(),
        )
        .await?
        .iter()
        .map(|raw| self.normalizer.normalize(raw, TxSource::Pending, None))
        .collect();
        Ok(dedup::merge(confirmed, pending))
    }

    pub async fn stats(&self) -> Result<Stats, ChainError> {
        let scan = self.scan(false).await?;
        Ok(compute_stats(&scan, self.normalizer.native_symbol()))
    }

    pub async fn latest_block(&self) -> Result<Option<BlockRecord>, ChainError> {
        let tip = self.scanner.tip().await?;
        self.scanner.block(tip).await
    }

    pub async fn block(&self, height: u64) -> Result<Option<BlockRecord>, ChainError> {
        self.scanner.block(height).await
    }

    /// Balance in whole tokens.
    pub async fn balance(&self, address: Address) -> Result<String, ChainError> {
        let wei = bounded(self.settings.upstream_timeout, self.client.balance(address)).await?;
        Ok(format_units(wei))
    }

    /// Broadcasts a transfer and waits for inclusion, bounded by `send_timeout`.
    pub async fn send(
        &self,
        private_key: &str,
        to: Address,
        value: U256,
    ) -> Result<String, ChainError> {
        let hash = bounded(
            self.settings.send_timeout,
            self.client.send_transfer(private_key, to, value),
        )
        .await
        .map_err(|e| {
            warn!(error = %e, "transfer failed");
            e
        })?;
        Ok(format!("0x{hash:x}"))
    }

    pub async fn health(&self) -> Result<HealthReport, ChainError> {
        let tip = self.scanner.tip().await?;
        Ok(HealthReport {
            status: "ok",
            tip,
            chain_id: self.settings.chain_id,
            scan: SCAN_STATS.snapshot(),
        })
    }
}
