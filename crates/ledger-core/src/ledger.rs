use crate::{
    constants::{MINING_REWARD, REWARD_SENDER},
    genesis_block, hash, now_timestamp,
    pow::ProofOfWork,
    validate, Block, LedgerError, LedgerResult, Transaction,
};
use tracing::{debug, info, warn};

/// Outcome of checking a block pushed by a peer against the local tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockVerdict {
    Accepted,
    RejectedBadProof,
    RejectedBadPrevHash,
    /// The block is not the direct successor of the tip; the sender may be
    /// ahead of us.
    IndexMismatch,
}

impl From<&LedgerError> for BlockVerdict {
    fn from(err: &LedgerError) -> Self {
        match err {
            LedgerError::InvalidIndex { .. } => BlockVerdict::IndexMismatch,
            LedgerError::InvalidPreviousHash { .. } => BlockVerdict::RejectedBadPrevHash,
            _ => BlockVerdict::RejectedBadProof,
        }
    }
}

/// A node's chain and pending-transaction pool.
///
/// The chain always holds the genesis block: it is pushed on construction and
/// [`Ledger::replace_chain`] only accepts chains rooted at genesis.
#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    pow: ProofOfWork,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(ProofOfWork::default())
    }
}

impl Ledger {
    pub fn new(pow: ProofOfWork) -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            pending: Vec::new(),
            pow,
        };
        ledger.genesis();
        ledger
    }

    fn genesis(&mut self) {
        self.chain.push(genesis_block());
    }

    pub fn pow(&self) -> ProofOfWork {
        self.pow
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn tip(&self) -> LedgerResult<&Block> {
        self.chain.last().ok_or(LedgerError::EmptyChain)
    }

    /// Index the tip's successor has to carry.
    fn next_index(&self) -> LedgerResult<u64> {
        let tip = self.tip()?;
        tip.index
            .checked_add(1)
            .ok_or(LedgerError::IndexOverflow { index: tip.index })
    }

    /// Queues a transaction and returns the index of the block it will land in.
    pub fn new_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: u64,
    ) -> LedgerResult<u64> {
        let next_index = self.next_index()?;
        self.pending.push(Transaction::new(sender, recipient, amount));
        Ok(next_index)
    }

    /// Appends a block holding every pending transaction and empties the pool.
    ///
    /// The proof is not checked here; callers verify it against the tip first
    /// (see [`Ledger::verify_proof`] and [`Ledger::forge`]).
    pub fn new_block(&mut self, proof: u64, previous_hash: Option<String>) -> LedgerResult<Block> {
        let previous_hash = match previous_hash {
            Some(h) => h,
            None => hash(self.tip()?),
        };
        let block = Block {
            index: self.chain.len() as u64 + 1,
            timestamp: now_timestamp(),
            transactions: std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        };
        self.chain.push(block.clone());
        debug!(index = block.index, txs = block.transactions.len(), "block appended");
        Ok(block)
    }

    pub fn verify_proof(&self, proof: u64) -> LedgerResult<()> {
        let tip = self.tip()?;
        if self.pow.valid_after(tip, proof) {
            Ok(())
        } else {
            Err(LedgerError::InvalidProof {
                index: tip.index,
                proof,
            })
        }
    }

    /// Verifies `proof` against the tip, pays `miner` and forges the block.
    /// Nothing changes when the proof is rejected.
    pub fn forge(&mut self, proof: u64, miner: &str) -> LedgerResult<Block> {
        self.verify_proof(proof)?;
        let previous_hash = hash(self.tip()?);
        self.new_transaction(REWARD_SENDER, miner, MINING_REWARD)?;
        let block = self.new_block(proof, Some(previous_hash))?;
        info!(index = block.index, proof, miner, "new block forged");
        Ok(block)
    }

    /// Structural checks for a block offered as the tip's successor, in order:
    /// index, previous hash, proof.
    pub fn check_successor(&self, block: &Block) -> LedgerResult<()> {
        let tip = self.tip()?;
        let expected = self.next_index()?;
        if block.index != expected {
            return Err(LedgerError::InvalidIndex {
                expected,
                found: block.index,
            });
        }
        let tip_hash = hash(tip);
        if tip_hash != block.previous_hash {
            return Err(LedgerError::InvalidPreviousHash {
                expected: tip_hash,
                found: block.previous_hash.clone(),
            });
        }
        if !self.pow.valid_after(tip, block.proof) {
            return Err(LedgerError::InvalidProof {
                index: tip.index,
                proof: block.proof,
            });
        }
        Ok(())
    }

    /// Appends a peer's block when it extends the tip.
    pub fn accept_block(&mut self, block: Block) -> BlockVerdict {
        match self.check_successor(&block) {
            Ok(()) => {
                info!(index = block.index, "accepted block from peer");
                self.chain.push(block);
                BlockVerdict::Accepted
            }
            Err(err) => {
                warn!(%err, "peer block not appended");
                BlockVerdict::from(&err)
            }
        }
    }

    /// Swaps in `candidate` wholesale if it is longer and fully valid. On any
    /// error the current chain is left untouched.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> LedgerResult<()> {
        if candidate.len() <= self.chain.len() {
            return Err(LedgerError::NotLonger {
                local: self.chain.len(),
                candidate: candidate.len(),
            });
        }
        validate::validate_rooted(&candidate, self.pow)?;
        info!(
            from = self.chain.len(),
            to = candidate.len(),
            "replacing local chain"
        );
        self.chain = candidate;
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        validate::is_valid(&self.chain, self.pow)
    }
}
