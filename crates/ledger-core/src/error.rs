use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("chain is empty")]
    EmptyChain,

    #[error("proof {proof} is not valid for the block after index {index}")]
    InvalidProof { index: u64, proof: u64 },

    #[error("invalid link at block {index}: {reason}")]
    InvalidChainLink { index: u64, reason: LinkFault },

    #[error("previous hash mismatch: expected {expected}, found {found}")]
    InvalidPreviousHash { expected: String, found: String },

    #[error("unexpected block index: expected {expected}, found {found}")]
    InvalidIndex { expected: u64, found: u64 },

    #[error("no block index follows {index}")]
    IndexOverflow { index: u64 },

    #[error("chain does not start with the genesis block")]
    InvalidGenesis,

    #[error("candidate chain of length {candidate} is not longer than local length {local}")]
    NotLonger { local: usize, candidate: usize },
}

/// Which half of a link check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFault {
    PreviousHash,
    Proof,
}

impl std::fmt::Display for LinkFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkFault::PreviousHash => f.write_str("previous hash does not match"),
            LinkFault::Proof => f.write_str("proof of work does not verify"),
        }
    }
}
