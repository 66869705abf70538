use ethers_core::types::{Address, U256};
use ethers_core::utils::to_checksum;
use ethers_signers::LocalWallet;

use crate::normalize::parse_units;

/// Accepts `0x` + 40 hex digits. All-lower or all-upper input is taken as is;
/// mixed case must carry a valid EIP-55 checksum.
pub fn parse_address(raw: &str) -> Option<Address> {
    let hex = raw.trim().strip_prefix("0x")?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let address: Address = format!("0x{}", hex.to_ascii_lowercase()).parse().ok()?;

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum(&address, None) != format!("0x{hex}") {
        return None;
    }
    Some(address)
}

/// Whole-token amount from a JSON string or number, strictly positive.
pub fn parse_amount(raw: &serde_json::Value) -> Option<U256> {
    let text = match raw {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    parse_units(&text).filter(|v| !v.is_zero())
}

/// Signing key from 32 bytes of hex, with or without `0x`. The parse error is
/// dropped because its text can echo the input.
pub fn parse_private_key(raw: &str) -> Option<LocalWallet> {
    raw.trim().trim_start_matches("0x").parse().ok()
}
