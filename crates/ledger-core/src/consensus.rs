//! Which of several candidate chains a node should adopt.
//!
//! The rule is longest valid chain by block count, not by accumulated work.
//! A candidate only wins by being strictly longer than everything seen before
//! it, so for equal lengths the earliest candidate in iteration order is kept.

use crate::{pow::ProofOfWork, validate::validate_rooted, Block};
use std::fmt::Display;
use tracing::debug;

pub fn select_longest<K, I>(local_len: usize, candidates: I, pow: ProofOfWork) -> Option<(K, Vec<Block>)>
where
    K: Display,
    I: IntoIterator<Item = (K, Vec<Block>)>,
{
    let mut best: Option<(K, Vec<Block>)> = None;
    let mut best_len = local_len;

    for (source, chain) in candidates {
        if chain.len() <= best_len {
            debug!(%source, len = chain.len(), best_len, "candidate chain not longer");
            continue;
        }
        match validate_rooted(&chain, pow) {
            Ok(()) => {
                best_len = chain.len();
                best = Some((source, chain));
            }
            Err(err) => debug!(%source, %err, "candidate chain invalid"),
        }
    }
    best
}
