//! JSON bodies exchanged with miners, clients and other nodes.

use ledger_core::{Block, Transaction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastBlockBody {
    pub last_block: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainBody {
    pub chain: Vec<Block>,
    pub length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidBody {
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockBody {
    pub block: Block,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MineRequest {
    pub proof: u64,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgedBody {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxIn {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub nodes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredBody {
    pub message: String,
    pub total_nodes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveBody {
    pub message: String,
    pub replaced: bool,
    pub length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}
