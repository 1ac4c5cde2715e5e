//! Talking to peers: pushing freshly forged blocks out and adopting a longer
//! chain when one exists. Peer lists and chain lengths are snapshotted under
//! the locks; all network I/O happens with no lock held.

use crate::state::AppState;
use ledger_core::{consensus::select_longest, Block};
use tokio::task::JoinSet;
use tracing::{info, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Replaced { peer: String, length: usize },
    Unchanged { length: usize },
}

impl ReconcileOutcome {
    pub fn length(&self) -> usize {
        match self {
            ReconcileOutcome::Replaced { length, .. } | ReconcileOutcome::Unchanged { length } => {
                *length
            }
        }
    }

    pub fn replaced(&self) -> bool {
        matches!(self, ReconcileOutcome::Replaced { .. })
    }
}

impl AppState {
    /// Sends `block` to every registered peer concurrently. A failing peer is
    /// logged and recorded; the rest still get the block.
    pub async fn broadcast(&self, block: &Block) -> BroadcastReport {
        let peers = self.peers.read().await.snapshot();
        let mut tasks = JoinSet::new();
        for peer in peers {
            let client = self.client.clone();
            let block = block.clone();
            tasks.spawn(async move {
                let result = client.push_block(&peer, &block).await;
                (peer, result)
            });
        }

        let mut report = BroadcastReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((peer, Ok(message))) => {
                    info!(%peer, index = block.index, %message, "block broadcast");
                    report.delivered.push(peer);
                }
                Ok((peer, Err(err))) => {
                    warn!(%peer, %err, "block broadcast failed");
                    report.failed.push(peer);
                }
                Err(err) => warn!(%err, "broadcast task failed"),
            }
        }
        report.delivered.sort();
        report.failed.sort();
        report
    }

    /// Fetches every peer's chain and swaps in the longest valid one if it
    /// beats the local chain. Unreachable peers are skipped.
    pub async fn reconcile(&self) -> ReconcileOutcome {
        let peers = self.peers.read().await.snapshot();
        let (local_len, pow) = {
            let ledger = self.ledger.read().await;
            (ledger.len(), ledger.pow())
        };

        let mut tasks = JoinSet::new();
        for (order, peer) in peers.into_iter().enumerate() {
            let client = self.client.clone();
            tasks.spawn(async move {
                let result = client.fetch_chain(&peer).await;
                (order, peer, result)
            });
        }

        let mut fetched = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((order, peer, Ok(chain))) => fetched.push((order, peer, chain)),
                Ok((_, peer, Err(err))) => warn!(%peer, %err, "could not fetch peer chain"),
                Err(err) => warn!(%err, "chain fetch task failed"),
            }
        }
        fetched.sort_by_key(|(order, _, _)| *order);
        let candidates = fetched.into_iter().map(|(_, peer, chain)| (peer, chain));

        let Some((peer, chain)) = select_longest(local_len, candidates, pow) else {
            return ReconcileOutcome::Unchanged { length: local_len };
        };

        let mut ledger = self.ledger.write().await;
        match ledger.replace_chain(chain) {
            Ok(()) => {
                info!(%peer, length = ledger.len(), "chain replaced by peer chain");
                ReconcileOutcome::Replaced {
                    peer,
                    length: ledger.len(),
                }
            }
            Err(err) => {
                // The local chain moved while the peers were being queried.
                warn!(%peer, %err, "peer chain no longer adoptable");
                ReconcileOutcome::Unchanged {
                    length: ledger.len(),
                }
            }
        }
    }
}
