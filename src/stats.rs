use crate::models::{Scan, Stats, WindowCounts};

/// `totalTransactionsEstimate` is tip height times this factor, not a ledger count.
pub const TX_ESTIMATE_FACTOR: u64 = 5;

// Fixed values until a real accounting source exists.
pub const WALLETS_PLACEHOLDER: u64 = 5000;
pub const AVG_BLOCK_TIME_PLACEHOLDER: &str = "2.1s";
pub const SUPPLY_PLACEHOLDER: &str = "1,000,000";

pub fn compute_stats(scan: &Scan, native_symbol: &str) -> Stats {
    Stats {
        total_blocks: scan.tip,
        total_transactions_estimate: scan.tip.saturating_mul(TX_ESTIMATE_FACTOR),
        total_wallets_placeholder: WALLETS_PLACEHOLDER,
        avg_block_time_placeholder: AVG_BLOCK_TIME_PLACEHOLDER.to_string(),
        total_supply_placeholder: format!("{SUPPLY_PLACEHOLDER} {native_symbol}"),
        window: WindowCounts {
            blocks: scan.blocks.len(),
            transactions: scan.transaction_count(),
        },
    }
}
