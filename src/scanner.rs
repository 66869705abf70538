use std::sync::Arc;
use std::time::Duration;

use ethers_core::types::{Block, Transaction, U64};
use futures_util::{stream, StreamExt};
use tracing::debug;

use crate::chain::{bounded, ChainClient, ChainError};
use crate::models::{BlockRecord, BlockTransactions, RawTransaction, Scan};
use crate::normalize::{Normalizer, TxSource};
use crate::scan_stats::SCAN_STATS;

/// Walks the most recent blocks below a pinned tip.
///
/// The window is `max(0, tip - window)..=tip`, inclusive on both ends, and is
/// emitted newest first. A height the node cannot serve (absent block, rpc
/// error, timeout) is skipped; only the tip fetch is fatal.
#[derive(Clone)]
pub struct BlockWindowScanner {
    client: Arc<dyn ChainClient>,
    normalizer: Normalizer,
    timeout: Duration,
    concurrency: usize,
}

impl BlockWindowScanner {
    pub fn new(
        client: Arc<dyn ChainClient>,
        normalizer: Normalizer,
        timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            normalizer,
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn tip(&self) -> Result<u64, ChainError> {
        bounded(self.timeout, self.client.block_number()).await
    }

    pub async fn scan(&self, window: u64, with_transactions: bool) -> Result<Scan, ChainError> {
        let tip = self.tip().await?;
        Ok(self.scan_at(tip, window, with_transactions).await)
    }

    pub async fn scan_at(&self, tip: u64, window: u64, with_transactions: bool) -> Scan {
        let lower = tip.saturating_sub(window);

        // `buffered` yields in input order, so newest-first survives any concurrency.
        let fetched: Vec<Option<BlockRecord>> = stream::iter((lower..=tip).rev())
            .map(|height| self.fetch_or_skip(height, with_transactions))
            .buffered(self.concurrency)
            .collect()
            .await;

        let attempted = fetched.len() as u64;
        let blocks: Vec<BlockRecord> = fetched.into_iter().flatten().collect();
        SCAN_STATS.inc_blocks_scanned(blocks.len() as u64);
        SCAN_STATS.inc_blocks_skipped(attempted - blocks.len() as u64);

        Scan { tip, blocks }
    }

    /// Strict single-block lookup; errors are returned rather than skipped.
    pub async fn block(&self, height: u64) -> Result<Option<BlockRecord>, ChainError> {
        self.fetch_full(height).await
    }

    async fn fetch_or_skip(&self, height: u64, with_transactions: bool) -> Option<BlockRecord> {
        let result = if with_transactions {
            self.fetch_full(height).await
        } else {
            self.fetch_count(height).await
        };

        match result {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                debug!(height, "block not available, skipping");
                None
            }
            Err(err) => {
                debug!(height, error = %err, "block fetch failed, skipping");
                None
            }
        }
    }

    async fn fetch_count(&self, height: u64) -> Result<Option<BlockRecord>, ChainError> {
        let block = bounded(self.timeout, self.client.block(height)).await?;
        Ok(block.map(|b| BlockRecord {
            height,
            timestamp: b.timestamp.low_u64(),
            transactions: BlockTransactions::Count(b.transactions.len()),
        }))
    }

    async fn fetch_full(&self, height: u64) -> Result<Option<BlockRecord>, ChainError> {
        match bounded(self.timeout, self.client.block_with_transactions(height)).await {
            Ok(Some(block)) => return Ok(Some(self.full_record(height, block))),
            Ok(None) => return Ok(None),
            Err(err) => {
                debug!(height, error = %err, "full block fetch failed, hydrating from hashes");
            }
        }

        let Some(hash_block) = bounded(self.timeout, self.client.block(height)).await? else {
            return Ok(None);
        };

        let mut txs = Vec::with_capacity(hash_block.transactions.len());
        for tx_hash in &hash_block.transactions {
            match bounded(self.timeout, self.client.transaction(*tx_hash)).await {
                Ok(Some(tx)) => txs.push(tx),
                Ok(None) => debug!(height, tx = ?tx_hash, "transaction vanished, skipping"),
                Err(err) => debug!(height, tx = ?tx_hash, error = %err, "transaction fetch failed"),
            }
        }

        let block = Block {
            timestamp: hash_block.timestamp,
            transactions: txs,
            ..Default::default()
        };
        Ok(Some(self.full_record(height, block)))
    }

    fn full_record(&self, height: u64, block: Block<Transaction>) -> BlockRecord {
        let timestamp = block.timestamp.low_u64();
        let records: Vec<_> = block
            .transactions
            .into_iter()
            .map(|mut tx| {
                tx.block_number.get_or_insert(U64::from(height));
                self.normalizer.normalize(
                    &RawTransaction::Node(Box::new(tx)),
                    TxSource::Confirmed,
                    Some(timestamp),
                )
            })
            .collect();
        SCAN_STATS.inc_transactions_normalized(records.len() as u64);

        BlockRecord {
            height,
            timestamp,
            transactions: BlockTransactions::Full(records),
        }
    }
}
