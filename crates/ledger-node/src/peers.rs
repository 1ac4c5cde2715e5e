use crate::{
    api::{BlockBody, ChainBody, MessageBody},
    constants::{CHAIN_PATH, INBOUND_BLOCK_PATH, PEER_CONNECT_TIMEOUT_MS},
    error::PeerError,
};
use ledger_core::Block;
use reqwest::{Client, Url};
use std::{collections::BTreeSet, time::Duration};

/// Known peers, keyed by normalized base URL. Ordered so that every pass over
/// the peers visits them in the same order.
#[derive(Debug, Clone, Default)]
pub struct PeerRegistry {
    peers: BTreeSet<String>,
}

impl PeerRegistry {
    /// Adds `address`; registering the same peer twice is a no-op.
    /// Returns whether the peer was new.
    pub fn register(&mut self, address: &str) -> Result<bool, PeerError> {
        let peer = normalize_address(address)?;
        Ok(self.peers.insert(peer))
    }

    pub fn contains(&self, address: &str) -> bool {
        normalize_address(address).is_ok_and(|peer| self.peers.contains(&peer))
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.peers.iter().cloned().collect()
    }
}

/// Accepts `host:port` or a full http(s) URL and returns the base URL without
/// a trailing slash.
pub fn normalize_address(address: &str) -> Result<String, PeerError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(PeerError::InvalidAddress(address.to_string()));
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let url = Url::parse(&with_scheme).map_err(|_| PeerError::InvalidAddress(address.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(PeerError::InvalidAddress(address.to_string()));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// HTTP client for node-to-node calls. Every request is bounded by the
/// configured timeout.
#[derive(Clone, Debug)]
pub struct PeerClient {
    http: Client,
}

impl PeerClient {
    pub fn new(timeout: Duration) -> Result<Self, PeerError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_millis(PEER_CONNECT_TIMEOUT_MS)))
            .build()
            .map_err(PeerError::Client)?;
        Ok(Self { http })
    }

    pub async fn fetch_chain(&self, peer: &str) -> Result<Vec<Block>, PeerError> {
        let resp = self
            .http
            .get(format!("{peer}{CHAIN_PATH}"))
            .send()
            .await
            .map_err(|source| PeerError::Unreachable {
                peer: peer.to_string(),
                source,
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PeerError::Rejected {
                peer: peer.to_string(),
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        let body: ChainBody = resp.json().await.map_err(|source| PeerError::Decode {
            peer: peer.to_string(),
            source,
        })?;
        Ok(body.chain)
    }

    /// Pushes `block` to the peer's inbound endpoint and returns its reply.
    pub async fn push_block(&self, peer: &str, block: &Block) -> Result<String, PeerError> {
        let resp = self
            .http
            .post(format!("{peer}{INBOUND_BLOCK_PATH}"))
            .json(&BlockBody {
                block: block.clone(),
            })
            .send()
            .await
            .map_err(|source| PeerError::Unreachable {
                peer: peer.to_string(),
                source,
            })?;
        let status = resp.status();
        let body: MessageBody = resp.json().await.map_err(|source| PeerError::Decode {
            peer: peer.to_string(),
            source,
        })?;
        if status.is_success() {
            Ok(body.message)
        } else {
            Err(PeerError::Rejected {
                peer: peer.to_string(),
                status: status.as_u16(),
                message: body.message,
            })
        }
    }
}
