//! HTTP adapter over the ledger
//!
//! Three routes, each a thin translation between HTTP and a [`Blockchain`]
//! call:
//!
//! - `GET /mine` seals the next block
//! - `GET /transactions/new` queues a transaction. It is a write behind a GET
//!   that reads a JSON body; the method is kept as is for wire compatibility
//!   with existing clients.
//! - `GET /chain` returns the full chain

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::blockchain::{Block, Blockchain};
use crate::error::ChainError;
use crate::transaction::Transaction;

const REQUIRED_TRANSACTION_FIELDS: [&str; 3] = ["sender", "recipient", "amount"];

// Response texts existing clients match on.
pub const MINED_MESSAGE: &str = "Blok baru telah ditambahkan";
pub const INCOMPLETE_TRANSACTION_MESSAGE: &str = "Data transaksi tidak lengkap";

pub fn queued_message(index: u64) -> String {
    format!("Transaksi akan dimasukkan ke dalam blok {}", index)
}

/// Handle shared by all request handlers.
#[derive(Clone)]
pub struct Node {
    pub blockchain: Arc<Blockchain>,
}

impl Node {
    pub fn new(blockchain: Blockchain) -> Self {
        Self {
            blockchain: Arc::new(blockchain),
        }
    }

    /// Serve a ledger that other parts of the process also hold.
    pub fn new_shared(blockchain: Arc<Blockchain>) -> Self {
        Self { blockchain }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BlockchainError(ChainError),
    /// Body was not a JSON object carrying every required transaction field.
    MissingValues,
    InvalidInput(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingValues => {
                (StatusCode::BAD_REQUEST, INCOMPLETE_TRANSACTION_MESSAGE).into_response()
            }
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::BlockchainError(e) => {
                tracing::error!(error = %e, "ledger operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { error: e.to_string() }),
                )
                    .into_response()
            }
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: msg })).into_response()
            }
        }
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::BlockchainError(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MineResponse {
    pub message: String,
    pub block_index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

#[derive(Debug, Serialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
}

#[derive(Debug, Serialize)]
struct SuccessResponse {
    message: String,
}

/// Parse a transaction body, requiring every field to be present before
/// looking at types.
fn parse_transaction(body: &[u8]) -> Result<Transaction, ApiError> {
    let values: Value = serde_json::from_slice(body).map_err(|_| ApiError::MissingValues)?;
    let fields = values.as_object().ok_or(ApiError::MissingValues)?;
    if !REQUIRED_TRANSACTION_FIELDS
        .iter()
        .all(|field| fields.contains_key(*field))
    {
        return Err(ApiError::MissingValues);
    }

    serde_json::from_value(values)
        .map_err(|e| ApiError::InvalidInput(format!("Invalid transaction: {}", e)))
}

// ============================================================================
// Middleware
// ============================================================================

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints.
pub fn build_api_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![http::Method::GET, http::Method::OPTIONS])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    Router::new()
        .route("/mine", get(mine))
        .route("/transactions/new", get(new_transaction))
        .route("/chain", get(full_chain))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(node)
        .layer(cors)
}

pub async fn run_api_server(node: Arc<Node>, addr: SocketAddr) -> Result<(), ChainError> {
    let app = build_api_router(node);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "API server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn mine(State(node): State<Arc<Node>>) -> Result<Json<MineResponse>, ApiError> {
    // The proof search is CPU-bound; keep it off the async workers.
    let blockchain = node.blockchain.clone();
    let block = tokio::task::spawn_blocking(move || blockchain.mine_next())
        .await
        .map_err(|e| ApiError::InternalError(format!("Mining task failed: {}", e)))??;

    Ok(Json(MineResponse {
        message: MINED_MESSAGE.to_string(),
        block_index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}

async fn new_transaction(
    State(node): State<Arc<Node>>,
    body: Bytes,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    let tx = parse_transaction(&body)?;
    let index = node.blockchain.submit_transaction(tx)?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            message: queued_message(index),
        }),
    ))
}

async fn full_chain(State(node): State<Arc<Node>>) -> Json<ChainResponse> {
    let (chain, length) = node.blockchain.chain();
    Json(ChainResponse { chain, length })
}
