use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide scan counters. Diagnostic only; never feeds a response body
/// other than the health report.
#[derive(Debug)]
pub struct ScanStats {
    blocks_scanned: AtomicU64,
    blocks_skipped: AtomicU64,
    transactions_normalized: AtomicU64,
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanStats {
    pub const fn new() -> Self {
        Self {
            blocks_scanned: AtomicU64::new(0),
            blocks_skipped: AtomicU64::new(0),
            transactions_normalized: AtomicU64::new(0),
        }
    }

    pub fn inc_blocks_scanned(&self, n: u64) {
        self.blocks_scanned.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_blocks_skipped(&self, n: u64) {
        self.blocks_skipped.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_transactions_normalized(&self, n: u64) {
        self.transactions_normalized.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            blocks_scanned: self.blocks_scanned.load(Ordering::Relaxed),
            blocks_skipped: self.blocks_skipped.load(Ordering::Relaxed),
            transactions_normalized: self.transactions_normalized.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSnapshot {
    pub blocks_scanned: u64,
    pub blocks_skipped: u64,
    pub transactions_normalized: u64,
}

pub static SCAN_STATS: ScanStats = ScanStats::new();
