use crate::{canonical_string, pow::ProofOfWork, Block};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, info};

/// How many proofs the sequential solver tries between cancellation checks.
const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// Shared flag a running search polls; cancelling one clone cancels them all.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Exhaustive search from zero. Returns the first proof that satisfies `pow`.
pub fn solve(pow: ProofOfWork, block_string: &str) -> u64 {
    let prefix = Sha256::new_with_prefix(block_string.as_bytes());
    let mut proof = 0u64;
    while !pow.matches(&prefix, proof) {
        proof = proof.wrapping_add(1);
    }
    proof
}

/// Proof for the block that will follow `last_block`.
pub fn solve_block(pow: ProofOfWork, last_block: &Block) -> u64 {
    solve(pow, &canonical_string(last_block))
}

/// Same search as [`solve`], giving up with `None` once `cancel` fires.
pub fn solve_cancellable(pow: ProofOfWork, block_string: &str, cancel: &CancelToken) -> Option<u64> {
    let prefix = Sha256::new_with_prefix(block_string.as_bytes());
    let mut proof = 0u64;
    loop {
        if proof % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            debug!(proof, "proof search cancelled");
            return None;
        }
        if pow.matches(&prefix, proof) {
            return Some(proof);
        }
        proof = proof.wrapping_add(1);
    }
}

/// Searches the proof space on the rayon pool. `find_first` keeps the answer
/// identical to the sequential solver.
pub fn solve_parallel(pow: ProofOfWork, block_string: &str, cancel: &CancelToken) -> Option<u64> {
    let prefix = Sha256::new_with_prefix(block_string.as_bytes());
    let found = (0u64..u64::MAX)
        .into_par_iter()
        .find_first(|proof| cancel.is_cancelled() || pow.matches(&prefix, *proof))?;

    if !pow.matches(&prefix, found) {
        debug!("parallel proof search cancelled");
        return None;
    }
    info!(proof = found, difficulty = pow.difficulty(), "found proof");
    Some(found)
}
