use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{
    Address, Block, BlockId, BlockNumber, Transaction, TransactionRequest, H256, U256,
};
use ethers_providers::{Http, Middleware, Provider};
use ethers_signers::Signer;
use url::Url;

use crate::chain::{ChainClient, ChainError};
use crate::models::{PendingFeed, RawTransaction};
use crate::validate::parse_private_key;

/// [`ChainClient`] backed by an ethers HTTP provider, with an optional
/// pending-pool feed served by a companion node API.
#[derive(Clone)]
pub struct EthClient {
    provider: Provider<Http>,
    http: reqwest::Client,
    rpc_url: String,
    pending_feed_url: Option<String>,
    chain_id: u64,
}

impl EthClient {
    pub fn new(
        rpc_url: &str,
        pending_feed_url: Option<String>,
        chain_id: u64,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;
        let url = Url::parse(rpc_url).context("invalid CHAIN_RPC_URL")?;
        let transport = Http::new_with_client(url, client.clone());
        let provider = Provider::new(transport);
        Ok(Self {
            provider,
            http: client,
            rpc_url: rpc_url.to_string(),
            pending_feed_url,
            chain_id,
        })
    }

    /// Maps a provider error to [`ChainError`], scrubbing the endpoint URL
    /// (which may embed an API key) from the message.
    fn upstream(&self, err: impl std::fmt::Display) -> ChainError {
        ChainError::Rpc(redact(&err.to_string(), &self.rpc_url))
    }

    async fn pool_feed(&self, base: &str) -> Result<Vec<RawTransaction>, ChainError> {
        let feed: PendingFeed = self
            .http
            .get(format!("{base}/pending_transactions"))
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| ChainError::PendingFeed(redact(&e.to_string(), base)))?
            .json()
            .await
            .map_err(|e| ChainError::PendingFeed(redact(&e.to_string(), base)))?;

        Ok(feed
            .pending_transactions
            .into_iter()
            .map(RawTransaction::Pool)
            .collect())
    }
}

#[async_trait]
impl ChainClient for EthClient {
    async fn block_number(&self) -> Result<u64, ChainError> {
        let latest = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| self.upstream(e))?;
        Ok(latest.as_u64())
    }

    async fn block(&self, height: u64) -> Result<Option<Block<H256>>, ChainError> {
        self.provider
            .get_block(BlockId::Number(height.into()))
            .await
            .map_err(|e| self.upstream(e))
    }

    async fn block_with_transactions(
        &self,
        height: u64,
    ) -> Result<Option<Block<Transaction>>, ChainError> {
        self.provider
            .get_block_with_txs(BlockId::Number(height.into()))
            .await
            .map_err(|e| self.upstream(e))
    }

    async fn transaction(&self, hash: H256) -> Result<Option<Transaction>, ChainError> {
        self.provider
            .get_transaction(hash)
            .await
            .map_err(|e| self.upstream(e))
    }

    async fn balance(&self, address: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(address, None)
            .await
            .map_err(|e| self.upstream(e))
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| self.upstream(e))
    }

    async fn pending_transactions(&self) -> Result<Vec<RawTransaction>, ChainError> {
        if let Some(base) = &self.pending_feed_url {
            return self.pool_feed(base).await;
        }

        let pending = self
            .provider
            .get_block_with_txs(BlockId::Number(BlockNumber::Pending))
            .await
            .map_err(|e| self.upstream(e))?;
        Ok(pending
            .map(|block| {
                block
                    .transactions
                    .into_iter()
                    .map(|tx| RawTransaction::Node(Box::new(tx)))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn send_transfer(
        &self,
        private_key: &str,
        to: Address,
        value: U256,
    ) -> Result<H256, ChainError> {
        let wallet = parse_private_key(private_key)
            .ok_or_else(|| ChainError::Signer("invalid private key".to_string()))?
            .with_chain_id(self.chain_id);

        let mut tx: TypedTransaction = TransactionRequest::new()
            .from(wallet.address())
            .to(to)
            .value(value)
            .chain_id(self.chain_id)
            .into();
        self.provider
            .fill_transaction(&mut tx, None)
            .await
            .map_err(|e| self.upstream(e))?;

        let signature = wallet
            .sign_transaction(&tx)
            .await
            .map_err(|e| ChainError::Signer(e.to_string()))?;
        let pending = self
            .provider
            .send_raw_transaction(tx.rlp_signed(&signature))
            .await
            .map_err(|e| self.upstream(e))?;
        let tx_hash = pending.tx_hash();

        let receipt = pending.await.map_err(|e| self.upstream(e))?;
        if receipt.is_none() {
            tracing::warn!(tx = ?tx_hash, "transaction dropped before inclusion");
            return Err(ChainError::Rpc(format!(
                "transaction 0x{tx_hash:x} was dropped from the mempool"
            )));
        }
        Ok(tx_hash)
    }
}

/// Replaces every spelling of `secret_url` in `message` with its bare
/// `scheme://host`. reqwest prints the parsed URL, which can differ from the
/// configured text (lowercased host, `/` before the query), so both forms
/// are scrubbed.
fn redact(message: &str, secret_url: &str) -> String {
    let secret_url = secret_url.trim();
    if secret_url.is_empty() {
        return message.to_string();
    }
    let Ok(parsed) = Url::parse(secret_url) else {
        return message.replace(secret_url, "<upstream>");
    };
    let shown = parsed
        .host_str()
        .map(|h| format!("{}://{}", parsed.scheme(), h))
        .unwrap_or_else(|| "<upstream>".to_string());

    let mut spellings = vec![
        secret_url.to_string(),
        parsed.as_str().to_string(),
        parsed.as_str().trim_end_matches('/').to_string(),
    ];
    spellings.sort_by_key(|s| std::cmp::Reverse(s.len()));
    spellings.dedup();

    let mut out = message.to_string();
    for spelling in spellings.iter().filter(|s| !s.is_empty()) {
        out = out.replace(spelling.as_str(), &shown);
    }
    // Leftover path or query text can still hold the key.
    let path = parsed.path();
    if path.len() > 1 {
        out = out.replace(path, "");
    }
    if let Some(query) = parsed.query() {
        out = out.replace(query, "");
    }
    out
}
