pub mod api;
pub mod chain;
pub mod config;
pub mod dedup;
pub mod error;
pub mod eth;
pub mod gateway;
pub mod models;
pub mod normalize;
pub mod rpc;
pub mod scan_stats;
pub mod scanner;
pub mod stats;
pub mod validate;
