use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use ethers_core::types::{Address, Block, Transaction, H160, H256, U256, U64};
use tokio::task::JoinHandle;

use chain_data_gateway::api::{app_router, AppState};
use chain_data_gateway::chain::{ChainClient, ChainError};
use chain_data_gateway::gateway::{Gateway, GatewaySettings};
use chain_data_gateway::models::{PoolTransaction, RawTransaction};

/// Canned node: blocks keyed by height, each holding `(timestamp, txs)`.
#[derive(Default)]
pub struct FakeNode {
    pub tip: Option<u64>,
    pub blocks: HashMap<u64, (u64, Vec<Transaction>)>,
    pub balance: U256,
    pub gas_price: U256,
    pub pending: Vec<PoolTransaction>,
}

impl FakeNode {
    pub fn with_blocks(tip: u64, heights: &[u64]) -> Self {
        let mut node = FakeNode {
            tip: Some(tip),
            ..Default::default()
        };
        for &height in heights {
            let mut tx = Transaction::default();
            tx.hash = H256::from_low_u64_be(height);
            tx.from = H160::from_low_u64_be(0xaa);
            tx.to = Some(H160::from_low_u64_be(0xbb));
            tx.value = U256::exp10(18);
            tx.block_number = Some(U64::from(height));
            node.blocks
                .insert(height, (1_700_000_000 + height, vec![tx]));
        }
        node
    }

    pub fn empty_blocks(tip: u64) -> Self {
        let mut node = FakeNode {
            tip: Some(tip),
            ..Default::default()
        };
        for height in 0..=tip {
            node.blocks.insert(height, (1_700_000_000 + height, Vec::new()));
        }
        node
    }

    fn header<T: Default>(&self, height: u64, txs: Vec<T>) -> Block<T> {
        let timestamp = self.blocks.get(&height).map(|(ts, _)| *ts).unwrap_or(0);
        Block {
            number: Some(U64::from(height)),
            timestamp: U256::from(timestamp),
            transactions: txs,
            ..Default::default()
        }
    }

    fn tip(&self) -> Result<u64, ChainError> {
        self.tip
            .ok_or_else(|| ChainError::Rpc("connection refused".to_string()))
    }
}

#[async_trait]
impl ChainClient for FakeNode {
    async fn block_number(&self) -> Result<u64, ChainError> {
        self.tip()
    }

    async fn block(&self, height: u64) -> Result<Option<Block<H256>>, ChainError> {
        Ok(self
            .blocks
            .get(&height)
            .map(|(_, txs)| self.header(height, txs.iter().map(|t| t.hash).collect())))
    }

    async fn block_with_transactions(
        &self,
        height: u64,
    ) -> Result<Option<Block<Transaction>>, ChainError> {
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
        self.tip()?;
        Ok(self.balance)
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        Ok(self.gas_price)
    }

    async fn pending_transactions(&self) -> Result<Vec<RawTransaction>, ChainError> {
        Ok(self.pending.iter().cloned().map(RawTransaction::Pool).collect())
    }

    async fn send_transfer(
        &self,
        _private_key: &str,
        _to: Address,
        _value: U256,
    ) -> Result<H256, ChainError> {
        Ok(H256::from_low_u64_be(0xbeef))
    }
}

pub async fn spawn_app(node: FakeNode) -> (String, JoinHandle<()>) {
    let state = AppState {
        gateway: Gateway::new(Arc::new(node), GatewaySettings::default()),
        allowed_origins: None,
    };
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);
    let server = axum::serve(listener, app);
    let handle = tokio::spawn(async move {
        let _ = server.await;
    });

    (base_url, handle)
}
