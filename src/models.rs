use ethers_core::types::Transaction;
use serde::{Deserialize, Serialize, Serializer};

/// Placeholder emitted for transactions that arrive without a hash.
pub const UNKNOWN_HASH: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxHash {
    Known(String),
    Unknown,
}

impl TxHash {
    pub fn from_optional(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if !s.is_empty() => TxHash::Known(s.to_string()),
            _ => TxHash::Unknown,
        }
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            TxHash::Known(h) => Some(h),
            TxHash::Unknown => None,
        }
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TxHash::Known(h) => serializer.serialize_str(h),
            TxHash::Unknown => serializer.serialize_str(UNKNOWN_HASH),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Confirmed,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub hash: TxHash,
    pub block_height: Option<u64>,
    pub from: String,
    pub to: Option<String>,
    pub value_decimal: String,
    pub status: TxStatus,
    pub token: String,
    pub timestamp_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    Full(Vec<TransactionRecord>),
    Count(usize),
}

impl BlockTransactions {
    pub fn len(&self) -> usize {
        match self {
            BlockTransactions::Full(txs) => txs.len(),
            BlockTransactions::Count(n) => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockRecord {
    pub height: u64,
    pub timestamp: u64,
    pub transactions: BlockTransactions,
}

/// Result of one window pass, with the tip it was pinned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scan {
    pub tip: u64,
    pub blocks: Vec<BlockRecord>,
}

impl Scan {
    /// Confirmed transactions in newest-first block order.
    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.blocks
            .iter()
            .filter_map(|b| match &b.transactions {
                BlockTransactions::Full(txs) => Some(txs.iter().cloned()),
                BlockTransactions::Count(_) => None,
            })
            .flatten()
            .collect()
    }

    pub fn transaction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.transactions.len()).sum()
    }
}

/// Entry of an external pending-pool feed. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolTransaction {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PendingFeed {
    #[serde(default)]
    pub pending_transactions: Vec<PoolTransaction>,
}

/// Transaction as handed over by a chain source, before normalization.
#[derive(Debug, Clone)]
pub enum RawTransaction {
    Node(Box<Transaction>),
    Pool(PoolTransaction),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub block: u64,
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowCounts {
    pub blocks: usize,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_blocks: u64,
    pub total_transactions_estimate: u64,
    pub total_wallets_placeholder: u64,
    pub avg_block_time_placeholder: String,
    pub total_supply_placeholder: String,
    pub window: WindowCounts,
}
