use std::env;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;

#[derive(Debug, Clone)]
pub struct Config {
    pub chain_rpc_url: String,
    pub http_bind_addr: String,
    pub allowed_origins: Option<Vec<HeaderValue>>,
    pub scan_window: u64,
    pub scan_concurrency: usize,
    pub upstream_timeout: Duration,
    pub send_timeout: Duration,
    pub chain_id: u64,
    pub network_id: u64,
    pub native_symbol: String,
    pub pending_feed_url: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing CHAIN_RPC_URL env var")]
    MissingRpcUrl,
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let chain_rpc_url = env::var("CHAIN_RPC_URL").map_err(|_| ConfigError::MissingRpcUrl)?;
        let http_bind_addr = env::var("HTTP_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
        let allowed_origins = match env::var("ALLOWED_ORIGINS") {
            Ok(raw) => Some(parse_origins(&raw)?).filter(|list| !list.is_empty()),
            Err(_) => None,
        };

        let scan_window = positive_var::<u64>("SCAN_WINDOW", 10)?;
        let scan_concurrency = positive_var::<usize>("SCAN_CONCURRENCY", 1)?;
        let upstream_timeout = Duration::from_secs(positive_var::<u64>("UPSTREAM_TIMEOUT_SECS", 10)?);
        let send_timeout = Duration::from_secs(positive_var::<u64>("SEND_TIMEOUT_SECS", 120)?);

        let chain_id = parse_var::<u64>("CHAIN_ID")?.unwrap_or(9999);
        let network_id = parse_var::<u64>("NETWORK_ID")?.unwrap_or(chain_id);
        let native_symbol = env::var("NATIVE_SYMBOL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "IFC".to_string());
        let pending_feed_url = env::var("PENDING_FEED_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            chain_rpc_url,
            http_bind_addr,
            allowed_origins,
            scan_window,
            scan_concurrency,
            upstream_timeout,
            send_timeout,
            chain_id,
            network_id,
            native_symbol,
            pending_feed_url,
        })
    }
}

fn parse_var<T: FromStr>(field: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(field) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                field,
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

fn positive_var<T>(field: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
    T::Err: std::fmt::Display,
{
    let value = parse_var::<T>(field)?.unwrap_or(default);
    if value == T::default() {
        return Err(ConfigError::InvalidValue {
            field,
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    let mut origins: Vec<HeaderValue> = Vec::new();
    for origin in raw
        .split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
    {
        let value = HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidValue {
            field: "ALLOWED_ORIGINS",
            message: format!("{origin:?} is not a valid origin header value"),
        })?;
        if !origins.contains(&value) {
            origins.push(value);
        }
    }
    Ok(origins)
}
