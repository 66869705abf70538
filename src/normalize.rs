use chrono::DateTime;
use ethers_core::types::{Transaction, H160, U256};
use serde_json::Value;

use crate::models::{PoolTransaction, RawTransaction, TransactionRecord, TxHash, TxStatus};

/// Decimal places between the smallest unit and one whole token.
pub const TOKEN_DECIMALS: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxSource {
    Confirmed,
    Pending,
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    native_symbol: String,
}

impl Normalizer {
    pub fn new(native_symbol: impl Into<String>) -> Self {
        Self {
            native_symbol: native_symbol.into(),
        }
    }

    pub fn native_symbol(&self) -> &str {
        &self.native_symbol
    }

    /// `block_timestamp` is the enclosing block's time for node transactions;
    /// pool entries carry their own.
    pub fn normalize(
        &self,
        raw: &RawTransaction,
        source: TxSource,
        block_timestamp: Option<u64>,
    ) -> TransactionRecord {
        match raw {
            RawTransaction::Node(tx) => self.normalize_node(tx, source, block_timestamp),
            RawTransaction::Pool(entry) => self.normalize_pool(entry, source),
        }
    }

    fn normalize_node(
        &self,
        tx: &Transaction,
        source: TxSource,
        block_timestamp: Option<u64>,
    ) -> TransactionRecord {
        let (status, block_height) = match source {
            TxSource::Confirmed => (TxStatus::Confirmed, tx.block_number.map(|n| n.as_u64())),
            TxSource::Pending => (TxStatus::Pending, None),
        };

        TransactionRecord {
            hash: TxHash::Known(format!("0x{:x}", tx.hash)),
            block_height,
            from: address_to_lower_hex(tx.from),
            to: tx.to.map(address_to_lower_hex),
            value_decimal: format_units(tx.value),
            status,
            token: self.native_symbol.clone(),
            timestamp_date: block_timestamp.and_then(display_date),
        }
    }

    fn normalize_pool(&self, entry: &PoolTransaction, source: TxSource) -> TransactionRecord {
        let status = match source {
            TxSource::Pending => TxStatus::Pending,
            TxSource::Confirmed => match entry.status.as_deref() {
                Some(s) if s.eq_ignore_ascii_case("pending") => TxStatus::Pending,
                _ => TxStatus::Confirmed,
            },
        };

        TransactionRecord {
            hash: TxHash::from_optional(entry.hash.as_deref()),
            block_height: None,
            from: entry
                .sender
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            to: entry.receiver.clone().filter(|s| !s.is_empty()),
            value_decimal: entry
                .amount
                .as_ref()
                .and_then(pool_amount)
                .unwrap_or_else(|| "0.0".to_string()),
            status,
            token: entry
                .token
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| self.native_symbol.clone()),
            timestamp_date: entry
                .timestamp
                .as_ref()
                .and_then(pool_timestamp)
                .and_then(display_date),
        }
    }
}

/// Renders a smallest-unit amount in whole tokens, keeping at least one
/// fractional digit (`10^18` -> `"1.0"`).
pub fn format_units(value: U256) -> String {
    let (whole, frac) = value.div_mod(U256::exp10(TOKEN_DECIMALS));
    let frac = format!("{:0>width$}", frac.to_string(), width = TOKEN_DECIMALS);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{frac}")
    }
}

/// Parses a positive whole-token decimal into smallest units. Rejects more
/// than `TOKEN_DECIMALS` fractional digits instead of rounding.
pub fn parse_units(raw: &str) -> Option<U256> {
    let raw = raw.trim();
    let (whole, frac) = match raw.split_once('.') {
        Some((w, f)) => (w, f),
        None => (raw, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if frac.len() > TOKEN_DECIMALS {
        return None;
    }
    let digits = format!("{whole}{frac:0<width$}", width = TOKEN_DECIMALS);
    U256::from_dec_str(&digits).ok()
}

pub fn display_date(unix_secs: u64) -> Option<String> {
    let secs = i64::try_from(unix_secs).ok()?;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}

fn pool_amount(value: &Value) -> Option<String> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    canonical_decimal(&text)
}

fn canonical_decimal(text: &str) -> Option<String> {
    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (text, None),
    };
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match frac {
        None => Some(format!("{whole}.0")),
        Some(f) if !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()) => {
            Some(text.to_string())
        }
        Some(_) => None,
    }
}

fn pool_timestamp(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn address_to_lower_hex(addr: H160) -> String {
    format!("0x{:x}", addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::types::{H256, U64};
    use serde_json::json;

    fn node_tx() -> Transaction {
        let mut tx = Transaction::default();
        tx.hash = H256::from_low_u64_be(1);
        tx.from = H160::from_low_u64_be(2);
        tx.to = Some(H160::from_low_u64_be(3));
        tx.value = U256::from_dec_str("1500000000000000000").unwrap();
        tx.block_number = Some(U64::from(42u64));
        tx
    }

    #[test]
    fn whole_token_converts_exactly() {
        let one = U256::from_dec_str("1000000000000000000").unwrap();
        assert_eq!(format_units(one), "1.0");
        assert_eq!(format_units(U256::zero()), "0.0");
        assert_eq!(format_units(U256::from(1u64)), "0.000000000000000001");
    }

    #[test]
    fn large_values_keep_every_digit() {
        let v = U256::from_dec_str("123456789000000000000000001").unwrap();
        assert_eq!(format_units(v), "123456789.000000000000000001");
    }

    #[test]
    fn parse_units_rejects_excess_precision() {
        assert_eq!(
            parse_units("1.5"),
            Some(U256::from_dec_str("1500000000000000000").unwrap())
        );
        assert_eq!(parse_units(".5"), Some(U256::exp10(17) * U256::from(5u64)));
        assert_eq!(parse_units("0.0000000000000000001"), None);
        assert_eq!(parse_units("abc"), None);
        assert_eq!(parse_units("-1"), None);
        assert_eq!(parse_units("."), None);
    }

    #[test]
    fn confirmed_node_tx_keeps_block_height() {
        let n = Normalizer::new("IFC");
        let record = n.normalize(
            &RawTransaction::Node(Box::new(node_tx())),
            TxSource::Confirmed,
            Some(1_700_000_000),
        );
        assert_eq!(record.block_height, Some(42));
        assert_eq!(record.status, TxStatus::Confirmed);
        assert_eq!(record.value_decimal, "1.5");
        assert_eq!(record.token, "IFC");
        assert_eq!(record.timestamp_date.as_deref(), Some("2023-11-14"));
        assert_eq!(
            record.hash.as_key(),
            Some("0x0000000000000000000000000000000000000000000000000000000000000001")
        );
    }

    #[test]
    fn pending_node_tx_drops_block_height() {
        let n = Normalizer::new("IFC");
        let record = n.normalize(
            &RawTransaction::Node(Box::new(node_tx())),
            TxSource::Pending,
            None,
        );
        assert_eq!(record.block_height, None);
        assert_eq!(record.status, TxStatus::Pending);
        assert_eq!(record.timestamp_date, None);
    }

    #[test]
    fn pool_entry_gets_defaults() {
        let n = Normalizer::new("IFC");
        let entry: PoolTransaction = serde_json::from_value(json!({
            "sender": "alice",
            "receiver": "bob",
            "amount": 2.5,
            "timestamp": 1_700_000_000.75
        }))
        .unwrap();
        let record = n.normalize(&RawTransaction::Pool(entry), TxSource::Pending, None);
        assert_eq!(record.hash, TxHash::Unknown);
        assert_eq!(record.status, TxStatus::Pending);
        assert_eq!(record.token, "IFC");
        assert_eq!(record.value_decimal, "2.5");
        assert_eq!(record.timestamp_date.as_deref(), Some("2023-11-14"));
    }

    #[test]
    fn confirmed_pool_entry_honours_explicit_fields() {
        let n = Normalizer::new("IFC");
        let entry: PoolTransaction = serde_json::from_value(json!({
            "hash": "0xabc",
            "sender": "alice",
            "amount": "10",
            "token": "GOLD"
        }))
        .unwrap();
        let record = n.normalize(&RawTransaction::Pool(entry), TxSource::Confirmed, None);
        assert_eq!(record.hash, TxHash::Known("0xabc".to_string()));
        assert_eq!(record.status, TxStatus::Confirmed);
        assert_eq!(record.token, "GOLD");
        assert_eq!(record.value_decimal, "10.0");
        assert_eq!(record.to, None);
    }

    #[test]
    fn malformed_pool_amount_falls_back_to_zero() {
        let n = Normalizer::new("IFC");
        let entry = PoolTransaction {
            amount: Some(json!("lots")),
            ..Default::default()
        };
        let record = n.normalize(&RawTransaction::Pool(entry), TxSource::Pending, None);
        assert_eq!(record.value_decimal, "0.0");
        assert_eq!(record.from, "unknown");
    }
}
