//! Minimal JSON-RPC surface answering a fixed set of read methods.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::chain::{bounded, ChainClient, ChainError};
use crate::validate::parse_address;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub method: Option<Value>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub result: Value,
}

#[derive(thiserror::Error, Debug)]
pub enum RpcError {
    #[error("Missing method in JSON-RPC request")]
    MalformedRequest,
    #[error("Method {0} not supported")]
    MethodNotSupported(String),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error(transparent)]
    Upstream(#[from] ChainError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    ChainId,
    BlockNumber,
    GetBalance,
    NetVersion,
    GasPrice,
}

impl Method {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "eth_chainId" => Some(Method::ChainId),
            "eth_blockNumber" => Some(Method::BlockNumber),
            "eth_getBalance" => Some(Method::GetBalance),
            "net_version" => Some(Method::NetVersion),
            "eth_gasPrice" => Some(Method::GasPrice),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct RpcShim {
    client: Arc<dyn ChainClient>,
    timeout: Duration,
    chain_id: u64,
    network_id: u64,
}

impl RpcShim {
    pub fn new(
        client: Arc<dyn ChainClient>,
        timeout: Duration,
        chain_id: u64,
        network_id: u64,
    ) -> Self {
        Self {
            client,
            timeout,
            chain_id,
            network_id,
        }
    }

    pub async fn handle(&self, request: RpcRequest) -> Result<RpcResponse, RpcError> {
        let name = request
            .method
            .as_ref()
            .and_then(Value::as_str)
            .ok_or(RpcError::MalformedRequest)?;
        info!(method = name, "rpc request");

        let method =
            Method::parse(name).ok_or_else(|| RpcError::MethodNotSupported(name.to_string()))?;

        let result = match method {
            Method::ChainId => Value::String(quantity(self.chain_id)),
            Method::NetVersion => Value::String(self.network_id.to_string()),
            Method::BlockNumber => {
                let tip = bounded(self.timeout, self.client.block_number()).await?;
                Value::String(quantity(tip))
            }
            Method::GetBalance => {
                let raw = first_param(request.params.as_ref())
                    .ok_or_else(|| RpcError::InvalidParams("missing address".to_string()))?;
                let address = raw
                    .as_str()
                    .and_then(parse_address)
                    .ok_or_else(|| RpcError::InvalidParams(format!("invalid address {raw}")))?;
                let balance = bounded(self.timeout, self.client.balance(address)).await?;
                Value::String(format!("0x{balance:x}"))
            }
            Method::GasPrice => {
                let price = bounded(self.timeout, self.client.gas_price()).await?;
                Value::String(format!("0x{price:x}"))
            }
        };

        Ok(RpcResponse {
            jsonrpc: "2.0",
            id: request.id,
            result,
        })
    }
}

fn first_param(params: Option<&Value>) -> Option<&Value> {
    match params? {
        Value::Array(items) => items.first(),
        _ => None,
    }
}

fn quantity(n: u64) -> String {
    format!("0x{n:x}")
}
