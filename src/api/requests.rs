//! Request bodies as they arrive on the wire, and their validated forms.

use ethers_core::types::{Address, U256};
use serde::Deserialize;
use serde_json::Value;

use crate::error::GatewayError;
use crate::validate::{parse_address, parse_amount, parse_private_key};

#[derive(Debug, Default, Deserialize)]
pub struct BalanceRequest {
    #[serde(default)]
    pub address: Option<String>,
}

impl BalanceRequest {
    pub fn validate(self) -> Result<Address, GatewayError> {
        self.address
            .as_deref()
            .and_then(parse_address)
            .ok_or_else(|| GatewayError::Validation("Invalid address".to_string()))
    }
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default, alias = "receiver")]
    pub to: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
}

// Hand-written so the key never reaches a log line.
impl std::fmt::Debug for SendRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendRequest")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("to", &self.to)
            .field("amount", &self.amount)
            .finish()
    }
}

pub struct Transfer {
    pub private_key: String,
    pub to: Address,
    pub value: U256,
}

impl SendRequest {
    pub fn validate(self) -> Result<Transfer, GatewayError> {
        let private_key = self.private_key.filter(|k| !k.trim().is_empty());
        let to = self.to.filter(|t| !t.trim().is_empty());
        let amount = self.amount.filter(|a| !a.is_null());

        let (Some(private_key), Some(to), Some(amount)) = (private_key, to, amount) else {
            return Err(GatewayError::Validation(
                "Missing parameters (privateKey, to, amount)".to_string(),
            ));
        };

        if parse_private_key(&private_key).is_none() {
            return Err(GatewayError::Validation("Invalid private key".to_string()));
        }
        let to = parse_address(&to)
            .ok_or_else(|| GatewayError::Validation("Invalid recipient address".to_string()))?;
        let value = parse_amount(&amount).ok_or_else(|| {
            GatewayError::Validation(
                "Invalid amount: expected a positive decimal with at most 18 fractional digits"
                    .to_string(),
            )
        })?;

        Ok(Transfer {
            private_key,
            to,
            value,
        })
    }
}

pub fn parse_height(raw: &str) -> Result<u64, GatewayError> {
    raw.trim()
        .parse()
        .map_err(|_| GatewayError::Validation(format!("Invalid block height {raw}")))
}
