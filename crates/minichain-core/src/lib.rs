use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub mod chain;
pub mod constants;
pub mod pow;
pub mod validate;

pub use chain::{Chain, TransactionPool};

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("chain has no genesis block")]
    NoGenesis,

    #[error("proof-of-work search interrupted")]
    Interrupted,

    #[error("chain tip changed while mining")]
    StaleTip,
}

pub type Result<T> = std::result::Result<T, ChainError>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

/// Link to the predecessor block. The genesis block carries the numeric
/// sentinel `0`; every other block carries the hex digest of its
/// predecessor. Serializes as a bare number or string accordingly.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PreviousHash {
    Sentinel(u64),
    Digest(String),
}

impl PreviousHash {
    pub fn genesis() -> Self {
        PreviousHash::Sentinel(0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub nonce: u64,
    pub previous_hash: PreviousHash,
}

/// Canonical JSON encoding of a block: object keys sorted at every level,
/// compact separators. `serde_json::Value` objects iterate keys in sorted
/// order, so the output is independent of struct declaration order and of
/// the field order of any JSON the block was parsed from.
pub fn canonical_json(block: &Block) -> String {
    serde_json::to_value(block)
        .expect("block serializes to JSON")
        .to_string()
}

/// SHA-256 over the canonical encoding, hex-encoded. This digest is what
/// `previous_hash` links store and what chain validation re-derives.
pub fn block_hash(block: &Block) -> String {
    let digest = Sha256::digest(canonical_json(block).as_bytes());
    hex::encode(digest)
}

/// Current wall-clock time as milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as u64
}
