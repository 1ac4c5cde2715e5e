use crate::{
    api::{
        BlockBody, ChainBody, ForgedBody, Health, LastBlockBody, MessageBody, MineRequest,
        RegisterRequest, RegisteredBody, ResolveBody, TxIn, ValidBody,
    },
    error::ApiError,
    state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ledger_core::BlockVerdict;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/last_block", get(last_block))
        .route("/mine", post(mine))
        .route("/transactions/new", post(new_transaction))
        .route("/chain", get(full_chain))
        .route("/validate_chain", get(validate_chain))
        .route("/block/new", post(receive_block))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(resolve))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn message(text: impl Into<String>) -> Json<MessageBody> {
    Json(MessageBody {
        message: text.into(),
    })
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".into(),
    })
}

async fn last_block(State(state): State<AppState>) -> Result<Json<LastBlockBody>, ApiError> {
    let ledger = state.ledger.read().await;
    Ok(Json(LastBlockBody {
        last_block: ledger.tip()?.clone(),
    }))
}

/// Verifies a miner's proof against the tip, forges the block and pushes it
/// to the peers once the ledger lock is released.
async fn mine(
    State(state): State<AppState>,
    payload: Result<Json<MineRequest>, JsonRejection>,
) -> Result<Json<ForgedBody>, ApiError> {
    let Json(req) = payload?;
    let block = state.ledger.write().await.forge(req.proof, &req.id)?;

    let report = state.broadcast(&block).await;
    if !report.failed.is_empty() {
        info!(failed = ?report.failed, "some peers missed the new block");
    }

    Ok(Json(ForgedBody {
        message: "New Block Forged".into(),
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}

async fn new_transaction(
    State(state): State<AppState>,
    payload: Result<Json<TxIn>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let Json(tx) = payload?;
    let index = state
        .ledger
        .write()
        .await
        .new_transaction(tx.sender, tx.recipient, tx.amount)?;
    Ok((
        StatusCode::CREATED,
        message(format!("Transaction will be added to Block {index}")),
    ))
}

async fn full_chain(State(state): State<AppState>) -> Json<ChainBody> {
    let ledger = state.ledger.read().await;
    Json(ChainBody {
        chain: ledger.chain().to_vec(),
        length: ledger.len(),
    })
}

async fn validate_chain(State(state): State<AppState>) -> Json<ValidBody> {
    let valid = state.ledger.read().await.is_valid();
    Json(ValidBody { valid })
}

/// A peer announcing a block it forged. A block that does not directly extend
/// our tip means one of us is behind, so it triggers a reconcile.
async fn receive_block(
    State(state): State<AppState>,
    payload: Result<Json<BlockBody>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let Json(BlockBody { block }) = payload?;
    let verdict = state.ledger.write().await.accept_block(block);

    Ok(match verdict {
        BlockVerdict::Accepted => (StatusCode::OK, message("New block added to chain")),
        BlockVerdict::RejectedBadProof => {
            (StatusCode::BAD_REQUEST, message("New block has invalid proof"))
        }
        BlockVerdict::RejectedBadPrevHash => (
            StatusCode::BAD_REQUEST,
            message("New block has invalid previous hash"),
        ),
        BlockVerdict::IndexMismatch => {
            let outcome = state.reconcile().await;
            info!(?outcome, "reconciled after out-of-sequence block");
            (
                StatusCode::OK,
                message("New block has an invalid index. Updated chain."),
            )
        }
    })
}

async fn register_nodes(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredBody>), ApiError> {
    let Json(req) = payload?;
    let nodes = req.nodes.ok_or(ApiError::MissingNodes)?;

    let mut peers = state.peers.write().await;
    // Validate everything first so a bad entry registers nothing.
    let mut staged = peers.clone();
    for node in &nodes {
        staged.register(node)?;
    }
    *peers = staged;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredBody {
            message: "New nodes have been added".into(),
            total_nodes: peers.snapshot(),
        }),
    ))
}

async fn resolve(State(state): State<AppState>) -> Json<ResolveBody> {
    let outcome = state.reconcile().await;
    let message = if outcome.replaced() {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };
    Json(ResolveBody {
        message: message.into(),
        replaced: outcome.replaced(),
        length: outcome.length(),
    })
}
