use minichain_core::pow::StopSignal;
use minichain_core::Chain;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Runtime settings fixed at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    pub difficulty: u32,
    pub mining_reward: u64,
    pub miner_address: String,
    pub peer_timeout: Duration,
}

/// Node-wide shared state. The chain (blocks plus pool) sits behind a
/// single mutex so mining appends and consensus replacements are
/// mutually exclusive; guards are never held across an await point.
/// Peers keep registration order, which settles equal-length ties during
/// consensus resolution.
pub struct AppState {
    pub chain: Mutex<Chain>,
    pub peers: Mutex<Vec<String>>,
    /// Held for the whole of a mining attempt, so at most one nonce
    /// search is extending the chain at a time.
    pub mining: tokio::sync::Mutex<()>,
    pub http: reqwest::Client,
    pub stop: StopSignal,
    pub settings: Settings,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(settings: Settings, initial_balance: u64, peers: Vec<String>) -> SharedState {
        Arc::new(Self {
            chain: Mutex::new(Chain::new(settings.difficulty, initial_balance)),
            peers: Mutex::new(peers),
            mining: tokio::sync::Mutex::new(()),
            http: reqwest::Client::new(),
            stop: StopSignal::new(),
            settings,
        })
    }
}
