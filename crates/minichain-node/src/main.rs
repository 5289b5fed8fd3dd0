use anyhow::Result;
use clap::Parser;
use minichain_core::constants;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

mod consensus;
mod miner;
mod routes;
mod state;

use state::{AppState, Settings, SharedState};

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long, default_value_t = format!("127.0.0.1:{}", constants::DEFAULT_PORT))]
    listen: String,

    /// Required count of leading zero hex characters in proof digests
    #[arg(long, default_value_t = constants::DIFFICULTY)]
    difficulty: u32,

    /// Genesis allocation amount
    #[arg(long, default_value_t = constants::INITIAL_BALANCE)]
    initial_balance: u64,

    /// Amount of the reward transaction staged for each mined block
    #[arg(long, default_value_t = constants::MINING_REWARD)]
    mining_reward: u64,

    /// Address credited by reward transactions
    #[arg(long, default_value = "node")]
    miner_address: String,

    /// Peer address (host[:port]) consulted during consensus resolution; repeatable
    #[arg(long = "peer")]
    peers: Vec<String>,

    /// Per-peer timeout in milliseconds when fetching chains
    #[arg(long, default_value_t = 2000)]
    peer_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let settings = Settings {
        difficulty: args.difficulty,
        mining_reward: args.mining_reward,
        miner_address: args.miner_address,
        peer_timeout: Duration::from_millis(args.peer_timeout_ms),
    };
    let state = AppState::new(settings, args.initial_balance, args.peers);

    let app = routes::router(state.clone()).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = args.listen.parse()?;
    info!("minichain-node listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;
    Ok(())
}

/// Waits for ctrl-c, then interrupts any in-flight nonce search so the
/// mining task winds down with the server.
async fn shutdown_signal(state: SharedState) {
    let _ = signal::ctrl_c().await;
    info!("shutdown signal received");
    state.stop.trigger();
}
