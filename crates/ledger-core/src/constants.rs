pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// Leading hex zeros a proof digest must carry.
pub const POW_TARGET_DIFFICULTY: usize = 6;
pub const GENESIS_INDEX: u64 = 1;
pub const GENESIS_PROOF: u64 = 1;
pub const GENESIS_PREVIOUS_HASH: &str = "1";
/// Sender recorded on the transaction that pays a miner.
pub const REWARD_SENDER: &str = "0";
pub const MINING_REWARD: u64 = 1;
