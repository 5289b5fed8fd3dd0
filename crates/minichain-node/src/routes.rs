use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use minichain_core::{Block, ChainError, Transaction};

use crate::state::SharedState;
use crate::{consensus, miner};

#[derive(Serialize)]
pub struct ChainResponse {
    pub length: usize,
    pub chain: Vec<Block>,
}

#[derive(Deserialize)]
pub struct NewTransaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

#[derive(Serialize)]
pub struct TransactionAccepted {
    pub index: u64,
}

#[derive(Deserialize)]
pub struct RegisterNodes {
    pub nodes: Vec<String>,
}

#[derive(Serialize)]
pub struct PeerList {
    pub peers: Vec<String>,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub replaced: bool,
    pub length: usize,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chain", get(get_chain))
        .route("/transactions", post(submit_transaction))
        .route("/mine", post(mine))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", post(resolve))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Full chain in the representation peers consume: the block list plus
/// its length.
async fn get_chain(State(state): State<SharedState>) -> Json<ChainResponse> {
    let chain = state.chain.lock().expect("chain mutex");
    Json(ChainResponse {
        length: chain.len(),
        chain: chain.blocks().to_vec(),
    })
}

async fn submit_transaction(
    State(state): State<SharedState>,
    Json(req): Json<NewTransaction>,
) -> Result<Json<TransactionAccepted>, StatusCode> {
    let mut chain = state.chain.lock().expect("chain mutex");
    let index = chain
        .submit_transaction(Transaction {
            sender: req.sender,
            recipient: req.recipient,
            amount: req.amount,
        })
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(TransactionAccepted { index }))
}

async fn mine(State(state): State<SharedState>) -> Result<Json<Block>, (StatusCode, String)> {
    match miner::mine(&state).await {
        Ok(block) => Ok(Json(block)),
        Err(ChainError::StaleTip) => Err((
            StatusCode::CONFLICT,
            "chain tip changed while mining".to_string(),
        )),
        Err(ChainError::Interrupted) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "node is shutting down".to_string(),
        )),
        Err(err) => Err((StatusCode::INTERNAL_SERVER_ERROR, err.to_string())),
    }
}

async fn register_nodes(
    State(state): State<SharedState>,
    Json(req): Json<RegisterNodes>,
) -> Json<PeerList> {
    let mut peers = state.peers.lock().expect("peers mutex");
    for node in req.nodes {
        if !peers.contains(&node) {
            peers.push(node);
        }
    }
    Json(PeerList {
        peers: peers.clone(),
    })
}

async fn resolve(State(state): State<SharedState>) -> Json<ResolveResponse> {
    let replaced = consensus::resolve(&state).await;
    let length = state.chain.lock().expect("chain mutex").len();
    Json(ResolveResponse { replaced, length })
}
