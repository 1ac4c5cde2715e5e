use clap::Parser;
use ledger_node::{router, AppState, NodeConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = NodeConfig::parse();
    let state = AppState::from_config(&config)?;
    info!(
        difficulty = config.difficulty,
        peers = config.peers.len(),
        "ledger initialised with genesis block"
    );

    if config.sync_on_start {
        let outcome = state.reconcile().await;
        info!(?outcome, "startup reconcile finished");
    }

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("ledger-node listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            warn!(%err, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}
