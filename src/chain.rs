//! Capability interface over the remote chain node.
//!
//! The gateway only ever talks to the node through [`ChainClient`]; the ethers
//! backed implementation lives in [`crate::eth`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use ethers_core::types::{Address, Block, Transaction, H256, U256};

use crate::models::RawTransaction;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("upstream rpc error: {0}")]
    Rpc(String),
    #[error("upstream call timed out after {millis}ms")]
    Timeout { millis: u64 },
    #[error("pending feed error: {0}")]
    PendingFeed(String),
    #[error("signer error: {0}")]
    Signer(String),
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Block with transaction hashes only. `None` when the node has no such block.
    async fn block(&self, height: u64) -> Result<Option<Block<H256>>, ChainError>;

    async fn block_with_transactions(
        &self,
        height: u64,
    ) -> Result<Option<Block<Transaction>>, ChainError>;

    async fn transaction(&self, hash: H256) -> Result<Option<Transaction>, ChainError>;

    async fn balance(&self, address: Address) -> Result<U256, ChainError>;

    async fn gas_price(&self) -> Result<U256, ChainError>;

    /// Transactions awaiting inclusion, in whatever shape the pending source provides.
    async fn pending_transactions(&self) -> Result<Vec<RawTransaction>, ChainError>;

    /// Signs a plain value transfer, broadcasts it and waits for it to be mined.
    async fn send_transfer(
        &self,
        private_key: &str,
        to: Address,
        value: U256,
    ) -> Result<H256, ChainError>;
}

/// Runs an upstream call under `timeout`, folding expiry into [`ChainError::Timeout`].
pub async fn bounded<T, F>(timeout: Duration, fut: F) -> Result<T, ChainError>
where
    F: Future<Output = Result<T, ChainError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ChainError::Timeout {
            millis: timeout.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use ethers_core::types::{Address, Block, Transaction, H160, H256, U256, U64};

    use super::{ChainClient, ChainError};
    use crate::models::RawTransaction;

    /// In-memory node used by unit tests.
    #[derive(Default)]
    pub struct MockChain {
        pub tip: Option<u64>,
        pub blocks: HashMap<u64, (u64, Vec<Transaction>)>,
        pub failing: HashSet<u64>,
        pub slow: HashSet<u64>,
        pub full_blocks_unsupported: bool,
        pub balance: U256,
        pub gas_price: U256,
        pub pending: Vec<RawTransaction>,
        pub tip_calls: AtomicUsize,
    }

    pub fn tx(seed: u64, value_wei: u64) -> Transaction {
        let mut tx = Transaction::default();
        tx.hash = H256::from_low_u64_be(seed);
        tx.from = H160::from_low_u64_be(seed + 1000);
        tx.to = Some(H160::from_low_u64_be(seed + 2000));
        tx.value = U256::from(value_wei);
        tx
    }

    impl MockChain {
        pub fn with_tip(tip: u64) -> Self {
            Self {
                tip: Some(tip),
                ..Default::default()
            }
        }

        /// Populates every height in `from..=to` with one transaction each.
        pub fn fill(mut self, from: u64, to: u64) -> Self {
            for height in from..=to {
                let mut t = tx(height, 1_000_000_000_000_000_000);
                t.block_number = Some(U64::from(height));
                self.blocks
                    .insert(height, (1_700_000_000 + height * 2, vec![t]));
            }
            self
        }

        pub fn without(mut self, heights: &[u64]) -> Self {
            for h in heights {
                self.blocks.remove(h);
            }
            self
        }

        fn header<T: Default>(&self, height: u64, txs: Vec<T>) -> Block<T> {
            let timestamp = self.blocks.get(&height).map(|(ts, _)| *ts).unwrap_or(0);
            Block {
                number: Some(U64::from(height)),
                hash: Some(H256::from_low_u64_be(height)),
                timestamp: U256::from(timestamp),
                transactions: txs,
                ..Default::default()
            }
        }

        async fn guard(&self, height: u64) -> Result<(), ChainError> {
            if self.slow.contains(&height) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.failing.contains(&height) {
                return Err(ChainError::Rpc(format!("block {height} unavailable")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ChainClient for MockChain {
        async fn block_number(&self) -> Result<u64, ChainError> {
            self.tip_calls.fetch_add(1, Ordering::SeqCst);
            self.tip
                .ok_or_else(|| ChainError::Rpc("connection refused".to_string()))
        }

        async fn block(&self, height: u64) -> Result<Option<Block<H256>>, ChainError> {
            self.guard(height).await?;
            Ok(self.blocks.get(&height).map(|(_, txs)| {
                self.header(height, txs.iter().map(|t| t.hash).collect())
            }))
        }

        async fn block_with_transactions(
            &self,
            height: u64,
        ) -> Result<Option<Block<Transaction>>, ChainError> {
            self.guard(height).await?;
            if self.full_blocks_unsupported {
                return Err(ChainError::Rpc("full transactions unsupported".to_string()));
            }
            Ok(self
                .blocks
                .get(&height)
                .map(|(_, txs)| self.header(height, txs.clone())))
        }

        async fn transaction(&self, hash: H256) -> Result<Option<Transaction>, ChainError> {
            Ok(self
                .blocks
                .values()
                .flat_map(|(_, txs)| txs.iter())
                .find(|t| t.hash == hash)
                .cloned())
        }

        async fn balance(&self, _address: Address) -> Result<U256, ChainError> {
            Ok(self.balance)
        }

        async fn gas_price(&self) -> Result<U256, ChainError> {
            Ok(self.gas_price)
        }

        async fn pending_transactions(&self) -> Result<Vec<RawTransaction>, ChainError> {
            Ok(self.pending.clone())
        }

        async fn send_transfer(
            &self,
            _private_key: &str,
            _to: Address,
            _value: U256,
        ) -> Result<H256, ChainError> {
            Ok(H256::from_low_u64_be(0xfeed))
        }
    }
}
