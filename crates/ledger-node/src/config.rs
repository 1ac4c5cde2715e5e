use crate::constants::DEFAULT_PEER_TIMEOUT_MS;
use clap::Parser;
use ledger_core::{constants::POW_TARGET_DIFFICULTY, pow::ProofOfWork};
use std::{net::SocketAddr, time::Duration};

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node")]
#[command(about = "Proof-of-work ledger node")]
pub struct NodeConfig {
    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long, default_value = "127.0.0.1:5000")]
    pub listen: SocketAddr,

    /// Leading hex zeros a proof must produce
    #[arg(
        long,
        default_value_t = POW_TARGET_DIFFICULTY as u8,
        value_parser = clap::value_parser!(u8).range(1..=64)
    )]
    pub difficulty: u8,

    /// Peer base URL to register at startup (repeatable)
    #[arg(long = "peer")]
    pub peers: Vec<String>,

    /// Per-request timeout for peer calls, in milliseconds
    #[arg(long, default_value_t = DEFAULT_PEER_TIMEOUT_MS)]
    pub peer_timeout_ms: u64,

    /// Reconcile with the startup peers before serving
    #[arg(long)]
    pub sync_on_start: bool,
}

impl NodeConfig {
    pub fn pow(&self) -> ProofOfWork {
        ProofOfWork::new(usize::from(self.difficulty))
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }
}
