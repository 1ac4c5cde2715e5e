use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod consensus;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod mine;
pub mod validate;

pub use error::{LedgerError, LedgerResult, LinkFault};
pub use ledger::{BlockVerdict, Ledger};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// The block's fields as a JSON value, one entry per field.
    pub fn to_value(&self) -> Value {
        // Only strings and numbers inside, so serialization cannot fail.
        serde_json::to_value(self).unwrap_or_default()
    }

    pub fn canonical_string(&self) -> String {
        canonical_string(self)
    }

    pub fn hash(&self) -> String {
        hash(self)
    }
}

/// The fixed first block every chain has to start with.
pub fn genesis_block() -> Block {
    Block {
        index: constants::GENESIS_INDEX,
        timestamp: 0.0,
        transactions: vec![],
        proof: constants::GENESIS_PROOF,
        previous_hash: constants::GENESIS_PREVIOUS_HASH.to_string(),
    }
}

/// Compact JSON with object keys sorted at every level.
pub fn canonical_string(block: &Block) -> String {
    canonical_json(&block.to_value())
}

pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(val, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Lowercase hex SHA-256 of the block's canonical string.
pub fn hash(block: &Block) -> String {
    digest_hex(&canonical_string(block))
}

pub fn digest_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Seconds since the unix epoch, with sub-second precision.
pub fn now_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

pub mod pow {
    use super::{canonical_string, Block};
    use crate::constants::{HASH_HEX_SIZE, POW_TARGET_DIFFICULTY};
    use sha2::{Digest, Sha256};

    /// The puzzle: SHA-256 of `block_string` followed by the decimal proof
    /// must start with `difficulty` hex zeros.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ProofOfWork {
        difficulty: usize,
    }

    impl Default for ProofOfWork {
        fn default() -> Self {
            Self::new(POW_TARGET_DIFFICULTY)
        }
    }

    impl ProofOfWork {
        pub fn new(difficulty: usize) -> Self {
            Self {
                difficulty: difficulty.min(HASH_HEX_SIZE),
            }
        }

        pub fn difficulty(&self) -> usize {
            self.difficulty
        }

        pub fn valid_proof(&self, block_string: &str, proof: u64) -> bool {
            self.matches(&Sha256::new_with_prefix(block_string.as_bytes()), proof)
        }

        /// Checks `proof` as the successor proof of `prev`.
        pub fn valid_after(&self, prev: &Block, proof: u64) -> bool {
            self.valid_proof(&canonical_string(prev), proof)
        }

        /// `prefix` is a hasher that has already absorbed the block string.
        pub(crate) fn matches(&self, prefix: &Sha256, proof: u64) -> bool {
            let digest = prefix.clone().chain_update(proof.to_string().as_bytes()).finalize();
            leading_zero_nibbles(&digest) >= self.difficulty
        }
    }

    /// Verifier at the default difficulty.
    pub fn valid_proof(block_string: &str, proof: u64) -> bool {
        ProofOfWork::default().valid_proof(block_string, proof)
    }

    /// Number of leading `'0'` characters the hex rendering of `digest` has.
    pub fn leading_zero_nibbles(digest: &[u8]) -> usize {
        let mut total = 0;
        for b in digest {
            if *b == 0 {
                total += 2;
            } else {
                if *b < 0x10 {
                    total += 1;
                }
                break;
            }
        }
        total
    }
}
