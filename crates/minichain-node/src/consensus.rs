use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use minichain_core::{validate, Block};

use crate::state::SharedState;

/// What a peer serves from `GET /chain`.
#[derive(Debug, Deserialize)]
struct PeerChain {
    length: usize,
    chain: Vec<Block>,
}

/// Longest-valid-chain conflict resolution. Fetches every registered
/// peer concurrently with a per-peer timeout, validates candidate
/// chains, and adopts the longest one strictly longer than the local
/// chain. Fetches are joined in registration order, so equal-length
/// candidates go to the first registered peer. Returns true when the
/// local chain was replaced.
pub async fn resolve(state: &SharedState) -> bool {
    let peers: Vec<String> = state.peers.lock().expect("peers mutex").clone();
    if peers.is_empty() {
        return false;
    }

    let local_length = state.chain.lock().expect("chain mutex").len();
    let difficulty = state.settings.difficulty;
    let timeout = state.settings.peer_timeout;

    let fetches: Vec<_> = peers
        .iter()
        .map(|peer| {
            let client = state.http.clone();
            let peer = peer.clone();
            tokio::spawn(async move { fetch_peer_chain(&client, &peer, timeout).await })
        })
        .collect();

    let mut best: Option<PeerChain> = None;
    for (peer, fetch) in peers.iter().zip(fetches) {
        let Ok(Some(remote)) = fetch.await else {
            continue;
        };
        if remote.length != remote.chain.len() {
            warn!(
                %peer,
                reported = remote.length,
                actual = remote.chain.len(),
                "peer reported a length mismatching its chain; skipping"
            );
            continue;
        }
        let length_to_beat = best.as_ref().map_or(local_length, |b| b.length);
        if remote.length <= length_to_beat {
            continue;
        }
        if !validate::is_valid(&remote.chain, difficulty) {
            warn!(%peer, length = remote.length, "peer chain failed validation; skipping");
            continue;
        }
        best = Some(remote);
    }

    let Some(candidate) = best else {
        return false;
    };

    let mut chain = state.chain.lock().expect("chain mutex");
    // The local chain may have grown since the snapshot; re-check under
    // the lock so a replacement never discards a longer local chain.
    if candidate.chain.len() <= chain.len() {
        return false;
    }
    info!(length = candidate.chain.len(), "adopting longer peer chain");
    chain.replace(candidate.chain);
    true
}

async fn fetch_peer_chain(
    client: &reqwest::Client,
    peer: &str,
    timeout: Duration,
) -> Option<PeerChain> {
    let url = format!("http://{peer}/chain");
    let fetch = async {
        let response = match client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(peer, %err, "peer unreachable");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(peer, status = %response.status(), "peer returned non-success");
            return None;
        }
        match response.json::<PeerChain>().await {
            Ok(remote) => Some(remote),
            Err(err) => {
                warn!(peer, %err, "malformed peer payload");
                None
            }
        }
    };
    match tokio::time::timeout(timeout, fetch).await {
        Ok(result) => result,
        Err(_) => {
            warn!(peer, "peer timed out");
            None
        }
    }
}
