mod miner;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ledger_core::{constants::POW_TARGET_DIFFICULTY, pow::ProofOfWork};
use miner::{load_or_create_id, Miner};
use serde::Serialize;
use std::{path::PathBuf, time::Duration};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Mining client and CLI for the ledger node")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine blocks against a node until interrupted
    Mine {
        /// Node base URL (e.g. http://127.0.0.1:5000)
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        node: String,
        /// Leading hex zeros the node expects
        #[arg(
            long,
            default_value_t = POW_TARGET_DIFFICULTY as u8,
            value_parser = clap::value_parser!(u8).range(1..=64)
        )]
        difficulty: u8,
        /// File holding this miner's id; created on first run
        #[arg(long, default_value = "my_id")]
        id_file: PathBuf,
        /// Seconds between checks for a new tip while solving
        #[arg(long, default_value_t = 2)]
        poll_secs: u64,
    },
    /// Submit a transaction
    Submit {
        /// Node base URL (e.g. http://127.0.0.1:5000)
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        node: String,
        #[arg(long)]
        sender: String,
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        amount: u64,
    },
    /// Register peer nodes with a node
    Register {
        /// Node base URL (e.g. http://127.0.0.1:5000)
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        node: String,
        /// Peer base URLs
        #[arg(required = true, num_args = 1..)]
        peers: Vec<String>,
    },
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    recipient: String,
    amount: u64,
}

#[derive(Serialize)]
struct Register {
    nodes: Vec<String>,
}

async fn print_response(res: reqwest::Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    println!("{body}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Mine {
            node,
            difficulty,
            id_file,
            poll_secs,
        } => {
            let id = load_or_create_id(&id_file).await?;
            let mut miner = Miner::new(
                node,
                ProofOfWork::new(usize::from(difficulty)),
                id,
                Duration::from_secs(poll_secs.max(1)),
            );
            let finished = tokio::select! {
                res = miner.run() => Some(res),
                _ = tokio::signal::ctrl_c() => None,
            };
            match finished {
                Some(res) => res?,
                None => println!("stopped after mining {} coin(s)", miner.coins()),
            }
        }
        Command::Submit {
            node,
            sender,
            recipient,
            amount,
        } => {
            let tx = Tx {
                sender,
                recipient,
                amount,
            };
            let client = reqwest::Client::new();
            let res = client
                .post(format!("{node}/transactions/new"))
                .json(&tx)
                .send()
                .await?;
            print_response(res).await?;
        }
        Command::Register { node, peers } => {
            let client = reqwest::Client::new();
            let res = client
                .post(format!("{node}/nodes/register"))
                .json(&Register { nodes: peers })
                .send()
                .await?;
            print_response(res).await?;
        }
    }
    Ok(())
}
