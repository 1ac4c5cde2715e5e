/// Upper bound on a single request to a peer.
pub(crate) const DEFAULT_PEER_TIMEOUT_MS: u64 = 5_000;
pub(crate) const PEER_CONNECT_TIMEOUT_MS: u64 = 2_000;
pub(crate) const CHAIN_PATH: &str = "/chain";
pub(crate) const INBOUND_BLOCK_PATH: &str = "/block/new";
