use minichain_core::constants::REWARD_SENDER;
use minichain_core::{block_hash, pow, Block, ChainError, PreviousHash, Result, Transaction};
use tracing::{info, warn};

use crate::state::SharedState;

/// Mine one block on the shared chain without holding its lock for the
/// duration of the nonce search. Attempts are serialized through the
/// mining mutex, so only one search extends the chain at a time. The
/// tail is snapshotted up front; if the chain was replaced while the
/// search ran, the result is discarded and the caller gets `StaleTip`.
pub async fn mine(state: &SharedState) -> Result<Block> {
    let _attempt = state.mining.lock().await;

    let (last_nonce, tail_digest) = snapshot_tail(state)?;

    let difficulty = state.settings.difficulty;
    let stop = state.stop.clone();
    let nonce = tokio::task::spawn_blocking(move || pow::search(last_nonce, difficulty, &stop))
        .await
        .expect("nonce search task panicked")?;

    append_if_current(state, nonce, tail_digest)
}

/// Snapshots the tail the search will extend.
fn snapshot_tail(state: &SharedState) -> Result<(u64, String)> {
    let chain = state.chain.lock().expect("chain mutex");
    let tail = chain.last_block()?;
    Ok((tail.nonce, block_hash(tail)))
}

/// Appends the forged block only if the tail still matches the snapshot
/// taken before the search. The reward transaction joins the drained
/// pool here, once the append is certain, so a discarded result leaves
/// no stray reward behind.
fn append_if_current(state: &SharedState, nonce: u64, tail_digest: String) -> Result<Block> {
    let mut chain = state.chain.lock().expect("chain mutex");
    if block_hash(chain.last_block()?) != tail_digest {
        warn!(nonce, "discarding nonce: chain tip moved during the search");
        return Err(ChainError::StaleTip);
    }
    chain.submit_transaction(Transaction {
        sender: REWARD_SENDER.to_string(),
        recipient: state.settings.miner_address.clone(),
        amount: state.settings.mining_reward,
    })?;
    let block = chain
        .forge_block(nonce, PreviousHash::Digest(tail_digest))
        .clone();
    info!(index = block.index, nonce = block.nonce, "mined block");
    Ok(block)
}
