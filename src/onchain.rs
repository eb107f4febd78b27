//! Public Merkle verification boundary for on-chain callers.
//!
//! Independent of the predicate: this is the commutative sorted-pair
//! Keccak-256 algorithm used by registry contracts, where membership alone
//! (no hidden identity) is checked publicly. Because each pair is hashed in
//! sorted order, no index or position bits travel with the proof.
//!
//! This algorithm only matches trees whose interior nodes commit sorted
//! pairs; it is never applied to the positional trees built by
//! [`crate::merkle::MerkleTree`].

use crate::hashing::Hash;
use sha3::{Digest, Keccak256};

/// Keccak-256 of the pair in sorted order.
pub fn hash_sorted_pair(a: &Hash, b: &Hash) -> Hash {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Keccak256::new();
    hasher.update(lo);
    hasher.update(hi);
    hasher.finalize().into()
}

/// Replay a sorted-pair proof from `leaf` up to `root`.
pub fn verify(root: &Hash, leaf: &Hash, proof: &[Hash]) -> bool {
    let mut computed = *leaf;
    for sibling in proof {
        computed = hash_sorted_pair(&computed, sibling);
    }
    computed == *root
}
