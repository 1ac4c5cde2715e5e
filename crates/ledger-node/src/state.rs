use crate::{
    config::NodeConfig,
    error::PeerError,
    peers::{PeerClient, PeerRegistry},
};
use ledger_core::Ledger;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything a request handler can reach. The ledger sits behind a single
/// lock: mutations take the write half, reads share the read half.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<RwLock<Ledger>>,
    pub peers: Arc<RwLock<PeerRegistry>>,
    pub client: PeerClient,
}

impl AppState {
    pub fn new(ledger: Ledger, client: PeerClient) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            peers: Arc::new(RwLock::new(PeerRegistry::default())),
            client,
        }
    }

    pub fn from_config(config: &NodeConfig) -> Result<Self, PeerError> {
        let client = PeerClient::new(config.peer_timeout())?;
        let mut registry = PeerRegistry::default();
        for peer in &config.peers {
            registry.register(peer)?;
        }
        Ok(Self {
            ledger: Arc::new(RwLock::new(Ledger::new(config.pow()))),
            peers: Arc::new(RwLock::new(registry)),
            client,
        })
    }
}
