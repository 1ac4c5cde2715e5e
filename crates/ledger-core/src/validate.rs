//! Chain validation: hash continuity and proof of work between every pair of
//! adjacent blocks.

use crate::{
    canonical_string, constants::GENESIS_INDEX, digest_hex, genesis_block, pow::ProofOfWork,
    Block, LedgerError, LedgerResult, LinkFault,
};
use tracing::debug;

/// Walks `chain` and reports the first broken link. Chains of length 0 or 1
/// have no links and always pass.
pub fn validate(chain: &[Block], pow: ProofOfWork) -> LedgerResult<()> {
    for pair in chain.windows(2) {
        let (prev, block) = (&pair[0], &pair[1]);
        let prev_string = canonical_string(prev);

        if digest_hex(&prev_string) != block.previous_hash {
            return Err(LedgerError::InvalidChainLink {
                index: block.index,
                reason: LinkFault::PreviousHash,
            });
        }
        if !pow.valid_proof(&prev_string, block.proof) {
            return Err(LedgerError::InvalidChainLink {
                index: block.index,
                reason: LinkFault::Proof,
            });
        }
    }
    Ok(())
}

pub fn is_valid(chain: &[Block], pow: ProofOfWork) -> bool {
    match validate(chain, pow) {
        Ok(()) => true,
        Err(err) => {
            debug!(%err, len = chain.len(), "chain failed validation");
            false
        }
    }
}

/// [`validate`], plus the requirements that the chain starts at genesis and
/// that indices count up by one from there. Used before adopting a chain from
/// elsewhere.
pub fn validate_rooted(chain: &[Block], pow: ProofOfWork) -> LedgerResult<()> {
    match chain.first() {
        Some(first) if *first == genesis_block() => {}
        _ => return Err(LedgerError::InvalidGenesis),
    }
    for (expected, block) in (GENESIS_INDEX..).zip(chain) {
        if block.index != expected {
            return Err(LedgerError::InvalidIndex {
                expected,
                found: block.index,
            });
        }
    }
    validate(chain, pow)
}
