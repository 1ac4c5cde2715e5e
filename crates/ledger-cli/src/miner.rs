//! Mining client: fetch the node's tip, solve the puzzle locally and submit
//! the proof, forever.

use anyhow::{Context, Result};
use ledger_core::{
    canonical_string,
    mine::{solve_parallel, CancelToken},
    pow::ProofOfWork,
    Block, Transaction,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{
    io,
    path::Path,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct LastBlock {
    last_block: Block,
}

#[derive(Debug, Serialize)]
struct MineRequest<'a> {
    proof: u64,
    id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgeReply {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

/// Random 128-bit identifier, hex encoded.
pub fn new_miner_id() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// Reads the miner id stored at `path`, creating and saving a fresh one when
/// the file is missing or empty.
pub async fn load_or_create_id(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) if !contents.trim().is_empty() => return Ok(contents.trim().to_string()),
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("reading miner id from {}", path.display()))
        }
    }
    let id = new_miner_id();
    tokio::fs::write(path, &id)
        .await
        .with_context(|| format!("writing miner id to {}", path.display()))?;
    info!(path = %path.display(), "created new miner id");
    Ok(id)
}

async fn fetch_last_block(http: &Client, node: &str) -> Result<Block> {
    let body: LastBlock = http
        .get(format!("{node}/last_block"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(body.last_block)
}

/// Polls the node and fires `cancel` as soon as its tip differs from `tip`.
async fn watch_tip(http: Client, node: String, tip: Block, every: Duration, cancel: CancelToken) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if cancel.is_cancelled() {
            return;
        }
        match fetch_last_block(&http, &node).await {
            Ok(latest) if latest != tip => {
                info!(index = latest.index, "node tip moved, abandoning search");
                cancel.cancel();
                return;
            }
            Ok(_) => {}
            Err(err) => debug!(%err, "tip poll failed"),
        }
    }
}

pub struct Miner {
    http: Client,
    node: String,
    pow: ProofOfWork,
    id: String,
    poll: Duration,
    coins: u64,
}

impl Miner {
    pub fn new(node: impl Into<String>, pow: ProofOfWork, id: String, poll: Duration) -> Self {
        Self {
            http: Client::new(),
            node: node.into().trim_end_matches('/').to_string(),
            pow,
            id,
            poll,
            coins: 0,
        }
    }

    pub fn coins(&self) -> u64 {
        self.coins
    }

    /// One round: solve for the current tip and submit. `Ok(None)` means the
    /// round produced nothing (tip moved, or the node refused the proof).
    pub async fn mine_once(&mut self) -> Result<Option<ForgeReply>> {
        let started = Instant::now();
        let tip = fetch_last_block(&self.http, &self.node).await?;

        let cancel = CancelToken::new();
        let watcher = tokio::spawn(watch_tip(
            self.http.clone(),
            self.node.clone(),
            tip.clone(),
            self.poll,
            cancel.clone(),
        ));
        let block_string = canonical_string(&tip);
        let pow = self.pow;
        let search = cancel.clone();
        let proof = tokio::task::spawn_blocking(move || solve_parallel(pow, &block_string, &search))
            .await
            .context("proof search task failed")?;
        watcher.abort();

        let Some(proof) = proof else {
            return Ok(None);
        };
        info!(proof, index = tip.index, "proof found");

        let res = self
            .http
            .post(format!("{}/mine", self.node))
            .json(&MineRequest { proof, id: &self.id })
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!(%status, %body, "node refused proof");
            return Ok(None);
        }
        let reply: ForgeReply = res.json().await?;
        self.coins += 1;
        debug!(
            index = reply.index,
            proof = reply.proof,
            previous_hash = %reply.previous_hash,
            txs = reply.transactions.len(),
            "block forged"
        );
        println!(
            "{}. Get one more coin! Total: {} - Done in {:.2} seconds.",
            reply.message,
            self.coins,
            started.elapsed().as_secs_f64()
        );
        Ok(Some(reply))
    }

    /// Mines until the process is stopped. Network errors back off for one
    /// poll interval and retry.
    pub async fn run(&mut self) -> Result<()> {
        info!(node = %self.node, id = %self.id, difficulty = self.pow.difficulty(), "starting the mining");
        loop {
            if let Err(err) = self.mine_once().await {
                warn!(%err, "mining round failed");
                tokio::time::sleep(self.poll).await;
            }
        }
    }
}
