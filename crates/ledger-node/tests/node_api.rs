mod helpers;

use helpers::{get_chain, get_last_block, pow, spawn_node};
use ledger_core::{
    constants::{MINING_REWARD, REWARD_SENDER},
    genesis_block,
    mine::solve_block,
    Ledger, Transaction,
};
use ledger_node::api::{ForgedBody, Health, MessageBody, RegisteredBody, ValidBody};
use serde_json::json;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_and_last_block_on_fresh_node() -> anyhow::Result<()> {
    let node = spawn_node(Ledger::new(pow())).await;
    let http = reqwest::Client::new();

    let health: Health = http.get(format!("{}/health", node.url)).send().await?.json().await?;
    assert_eq!(health.status, "ok");

    assert_eq!(get_last_block(&http, &node.url).await, genesis_block());
    let chain = get_chain(&http, &node.url).await;
    assert_eq!(chain.length, 1);
    assert_eq!(chain.chain, vec![genesis_block()]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submit_transaction_reports_target_block() -> anyhow::Result<()> {
    let node = spawn_node(Ledger::new(pow())).await;
    let http = reqwest::Client::new();

    let res = http
        .post(format!("{}/transactions/new", node.url))
        .json(&json!({ "sender": "alice", "recipient": "bob", "amount": 5 }))
        .send()
        .await?;
    assert_eq!(res.status(), 201);
    let body: MessageBody = res.json().await?;
    assert_eq!(body.message, "Transaction will be added to Block 2");
    assert_eq!(
        node.state.ledger.read().await.pending(),
        &[Transaction::new("alice", "bob", 5)]
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submit_transaction_with_missing_fields_is_rejected() -> anyhow::Result<()> {
    let node = spawn_node(Ledger::new(pow())).await;
    let http = reqwest::Client::new();

    let res = http
        .post(format!("{}/transactions/new", node.url))
        .json(&json!({ "sender": "alice", "amount": 5 }))
        .send()
        .await?;
    assert_eq!(res.status(), 400);
    assert!(node.state.ledger.read().await.pending().is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn mining_a_valid_proof_forges_block() -> anyhow::Result<()> {
    let node = spawn_node(Ledger::new(pow())).await;
    let http = reqwest::Client::new();

    http.post(format!("{}/transactions/new", node.url))
        .json(&json!({ "sender": "0", "recipient": "abc", "amount": 1 }))
        .send()
        .await?
        .error_for_status()?;

    let tip = get_last_block(&http, &node.url).await;
    let proof = solve_block(pow(), &tip);
    let res = http
        .post(format!("{}/mine", node.url))
        .json(&json!({ "proof": proof, "id": "miner-7" }))
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    let forged: ForgedBody = res.json().await?;
    assert_eq!(forged.message, "New Block Forged");
    assert_eq!(forged.index, 2);
    assert_eq!(forged.proof, proof);
    assert_eq!(forged.previous_hash, tip.hash());
    assert_eq!(
        forged.transactions,
        vec![
            Transaction::new("0", "abc", 1),
            Transaction::new(REWARD_SENDER, "miner-7", MINING_REWARD),
        ]
    );

    let chain = get_chain(&http, &node.url).await;
    assert_eq!(chain.length, 2);
    assert_eq!(chain.chain[1].transactions, forged.transactions);
    assert!(node.state.ledger.read().await.pending().is_empty());

    let valid: ValidBody = http
        .get(format!("{}/validate_chain", node.url))
        .send()
        .await?
        .json()
        .await?;
    assert!(valid.valid);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_proof_is_rejected_and_chain_unchanged() -> anyhow::Result<()> {
    let node = spawn_node(Ledger::new(pow())).await;
    let http = reqwest::Client::new();

    let tip = get_last_block(&http, &node.url).await;
    let bad = (0u64..).find(|p| !pow().valid_after(&tip, *p)).unwrap();
    let res = http
        .post(format!("{}/mine", node.url))
        .json(&json!({ "proof": bad, "id": "miner" }))
        .send()
        .await?;
    assert_eq!(res.status(), 400);
    assert_eq!(get_chain(&http, &node.url).await.length, 1);
    assert!(node.state.ledger.read().await.pending().is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn mine_without_id_is_rejected() -> anyhow::Result<()> {
    let node = spawn_node(Ledger::new(pow())).await;
    let http = reqwest::Client::new();

    let proof = solve_block(pow(), &genesis_block());
    let res = http
        .post(format!("{}/mine", node.url))
        .json(&json!({ "proof": proof }))
        .send()
        .await?;
    assert_eq!(res.status(), 400);
    assert_eq!(get_chain(&http, &node.url).await.length, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stale_proof_is_rejected_after_tip_moves() -> anyhow::Result<()> {
    let node = spawn_node(Ledger::new(pow())).await;
    let http = reqwest::Client::new();

    let proof = solve_block(pow(), &genesis_block());
    let first = http
        .post(format!("{}/mine", node.url))
        .json(&json!({ "proof": proof, "id": "first" }))
        .send()
        .await?;
    assert_eq!(first.status(), 200);

    // A proof that solved genesis but does not solve the new tip.
    let tip = get_last_block(&http, &node.url).await;
    let genesis = genesis_block();
    let stale = (0u64..)
        .filter(|p| pow().valid_after(&genesis, *p))
        .find(|p| !pow().valid_after(&tip, *p))
        .unwrap();
    let second = http
        .post(format!("{}/mine", node.url))
        .json(&json!({ "proof": stale, "id": "second" }))
        .send()
        .await?;
    assert_eq!(second.status(), 400);
    assert_eq!(get_chain(&http, &node.url).await.length, 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn register_nodes_deduplicates() -> anyhow::Result<()> {
    let node = spawn_node(Ledger::new(pow())).await;
    let http = reqwest::Client::new();

    let res = http
        .post(format!("{}/nodes/register", node.url))
        .json(&json!({ "nodes": ["http://127.0.0.1:6001", "127.0.0.1:6001/", "http://127.0.0.1:6002"] }))
        .send()
        .await?;
    assert_eq!(res.status(), 201);
    let body: RegisteredBody = res.json().await?;
    assert_eq!(body.message, "New nodes have been added");
    assert_eq!(
        body.total_nodes,
        vec!["http://127.0.0.1:6001", "http://127.0.0.1:6002"]
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn register_nodes_requires_node_list() -> anyhow::Result<()> {
    let node = spawn_node(Ledger::new(pow())).await;
    let http = reqwest::Client::new();

    let res = http
        .post(format!("{}/nodes/register", node.url))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), 400);
    let body: MessageBody = res.json().await?;
    assert_eq!(body.message, "Error: Please supply a valid list of nodes");

    let res = http
        .post(format!("{}/nodes/register", node.url))
        .json(&json!({ "nodes": ["http://127.0.0.1:6001", "ftp://nope"] }))
        .send()
        .await?;
    assert_eq!(res.status(), 400);
    assert!(node.state.peers.read().await.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_transactions_are_all_kept() -> anyhow::Result<()> {
    let node = spawn_node(Ledger::new(pow())).await;
    let http = reqwest::Client::new();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..32u64 {
        let http = http.clone();
        let url = format!("{}/transactions/new", node.url);
        tasks.spawn(async move {
            http.post(url)
                .json(&json!({ "sender": format!("s{i}"), "recipient": "r", "amount": i }))
                .send()
                .await
                .map(|r| r.status())
        });
    }
    while let Some(status) = tasks.join_next().await {
        assert_eq!(status??, 201);
    }
    assert_eq!(node.state.ledger.read().await.pending().len(), 32);
    Ok(())
}
