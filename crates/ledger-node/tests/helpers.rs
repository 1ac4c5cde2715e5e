#![allow(dead_code)]

use ledger_core::{mine::solve_block, pow::ProofOfWork, Block, Ledger};
use ledger_node::{
    api::{ChainBody, LastBlockBody},
    peers::PeerClient,
    router, AppState,
};
use std::time::Duration;
use tokio::{net::TcpListener, task::JoinHandle};

pub const TEST_DIFFICULTY: usize = 2;
/// Request timeout of every spawned node's peer client.
pub const PEER_TIMEOUT: Duration = Duration::from_secs(2);

pub fn pow() -> ProofOfWork {
    ProofOfWork::new(TEST_DIFFICULTY)
}

/// A node served on an ephemeral localhost port for the lifetime of the value.
pub struct TestNode {
    pub url: String,
    pub state: AppState,
    handle: JoinHandle<()>,
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_node(ledger: Ledger) -> TestNode {
    let client = PeerClient::new(PEER_TIMEOUT).expect("peer client");
    let state = AppState::new(ledger, client);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = router(state.clone());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    TestNode {
        url: format!("http://{addr}"),
        state,
        handle,
    }
}

/// Ledger grown to `len` blocks, each forged with a valid proof for `miner`.
pub fn ledger_with_len(len: usize, miner: &str) -> Ledger {
    let mut ledger = Ledger::new(pow());
    while ledger.len() < len {
        let proof = solve_block(ledger.pow(), ledger.tip().unwrap());
        ledger.forge(proof, miner).unwrap();
    }
    ledger
}

/// An address nothing is listening on.
pub async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

/// An address that accepts connections and never answers.
pub async fn silent_address() -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    (format!("http://{addr}"), handle)
}

pub async fn get_chain(http: &reqwest::Client, node: &str) -> ChainBody {
    http.get(format!("{node}/chain"))
        .send()
        .await
        .expect("GET /chain")
        .json()
        .await
        .expect("chain body")
}

pub async fn get_last_block(http: &reqwest::Client, node: &str) -> Block {
    let body: LastBlockBody = http
        .get(format!("{node}/last_block"))
        .send()
        .await
        .expect("GET /last_block")
        .json()
        .await
        .expect("last block body");
    body.last_block
}
