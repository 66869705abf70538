pub mod requests;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::GatewayError;
use crate::gateway::{Gateway, HealthReport};
use crate::models::{BlockRecord, ChartPoint, Stats, TransactionRecord};
use crate::rpc::{RpcError, RpcRequest, RpcResponse};

use self::requests::{parse_height, BalanceRequest, SendRequest};

#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    pub allowed_origins: Option<Vec<HeaderValue>>,
}

#[derive(Serialize)]
struct LivenessResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct BalanceResponse {
    balance: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    message: &'static str,
    tx_hash: String,
}

#[derive(Serialize)]
struct FeedResponse {
    transactions: Vec<TransactionRecord>,
}

type ApiResult<T> = Result<Json<T>, GatewayError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, GatewayError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| GatewayError::Validation(rejection.body_text()))
}

async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        message: "Chain gateway is running. Use /api/* endpoints.",
    })
}

async fn json_rpc(
    State(state): State<AppState>,
    payload: Result<Json<RpcRequest>, JsonRejection>,
) -> ApiResult<RpcResponse> {
    let request = payload
        .map(|Json(inner)| inner)
        .map_err(|_| GatewayError::from(RpcError::MalformedRequest))?;
    Ok(Json(state.gateway.rpc().handle(request).await?))
}

async fn health(State(state): State<AppState>) -> ApiResult<HealthReport> {
    Ok(Json(state.gateway.health().await?))
}

async fn balance(
    State(state): State<AppState>,
    payload: Result<Json<BalanceRequest>, JsonRejection>,
) -> ApiResult<BalanceResponse> {
    let address = body(payload)?.validate()?;
    let balance = state.gateway.balance(address).await?;
    Ok(Json(BalanceResponse { balance }))
}

async fn send(
    State(state): State<AppState>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> ApiResult<SendResponse> {
    let transfer = body(payload)?.validate()?;
    let tx_hash = state
        .gateway
        .send(&transfer.private_key, transfer.to, transfer.value)
        .await?;
    tracing::info!(tx = %tx_hash, "transfer included");
    Ok(Json(SendResponse {
        message: "Transaction successful",
        tx_hash,
    }))
}

async fn transaction_details(State(state): State<AppState>) -> ApiResult<Vec<TransactionRecord>> {
    let transactions = state.gateway.transaction_details().await?;
    if transactions.is_empty() {
        return Err(GatewayError::Empty(
            "No recent transactions found".to_string(),
        ));
    }
    Ok(Json(transactions))
}

async fn transaction_details_get() -> GatewayError {
    GatewayError::Validation("Use POST instead of GET".to_string())
}

async fn transactions_chart(State(state): State<AppState>) -> ApiResult<Vec<ChartPoint>> {
    Ok(Json(state.gateway.chart().await?))
}

async fn transaction_feed(State(state): State<AppState>) -> ApiResult<FeedResponse> {
    let transactions = state.gateway.feed().await?;
    Ok(Json(FeedResponse { transactions }))
}

async fn stats(State(state): State<AppState>) -> ApiResult<Stats> {
    Ok(Json(state.gateway.stats().await?))
}

async fn latest_block(State(state): State<AppState>) -> ApiResult<BlockRecord> {
    state
        .gateway
        .latest_block()
        .await?
        .map(Json)
        .ok_or_else(|| GatewayError::Empty("Latest block not found".to_string()))
}

async fn block_by_height(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<BlockRecord> {
    let height = parse_height(&raw)?;
    state
        .gateway
        .block(height)
        .await?
        .map(Json)
        .ok_or_else(|| GatewayError::Empty(format!("Block {height} not found")))
}

fn cors_layer(allowed: Option<&Vec<HeaderValue>>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);
    match allowed {
        Some(origins) => layer.allow_origin(AllowOrigin::list(origins.iter().cloned())),
        None => layer.allow_origin(Any),
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(state.allowed_origins.as_ref());

    Router::new()
        .route("/", get(liveness).post(json_rpc))
        .route("/api/health", get(health))
        .route("/api/balance", post(balance))
        .route("/api/send", post(send))
        .route(
            "/api/transaction-details",
            post(transaction_details).get(transaction_details_get),
        )
        .route(
            "/api/transactions",
            get(transactions_chart).post(transactions_chart),
        )
        .route("/api/transaction-feed", get(transaction_feed))
        .route("/api/stats", post(stats))
        .route("/api/block/latest", get(latest_block))
        .route("/api/block/:height", get(block_by_height))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_http_server(addr: &str, state: AppState) -> Result<()> {
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
