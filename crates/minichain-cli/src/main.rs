use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "minichain-cli")]
#[command(about = "CLI client for a minichain node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:5000)
    #[arg(long, global = true, default_value = "http://127.0.0.1:5000")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction to the node's pool
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        recipient: String,
        /// Amount
        #[arg(long)]
        amount: u64,
    },
    /// Mine one block
    Mine,
    /// Fetch the node's full chain
    Chain,
    /// Register peer addresses (host[:port]) with the node
    RegisterPeers { peers: Vec<String> },
    /// Trigger consensus resolution against registered peers
    Resolve,
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    recipient: String,
    amount: u64,
}

#[derive(Serialize)]
struct Nodes {
    nodes: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let node = &cli.node;

    let res = match cli.cmd {
        Command::Submit {
            sender,
            recipient,
            amount,
        } => {
            let tx = Tx {
                sender,
                recipient,
                amount,
            };
            client
                .post(format!("{node}/transactions"))
                .json(&tx)
                .send()
                .await?
        }
        Command::Mine => client.post(format!("{node}/mine")).send().await?,
        Command::Chain => client.get(format!("{node}/chain")).send().await?,
        Command::RegisterPeers { peers } => {
            client
                .post(format!("{node}/nodes/register"))
                .json(&Nodes { nodes: peers })
                .send()
                .await?
        }
        Command::Resolve => client.post(format!("{node}/nodes/resolve")).send().await?,
    };

    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    println!("{body}");
    Ok(())
}
