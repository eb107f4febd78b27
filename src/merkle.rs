//! Merkle accumulator over a canonicalized leaf set.
//!
//! The tree has a fixed depth: the leaf layer always holds `2^depth` slots,
//! with unused slots filled by the profile's empty-leaf hash. Leaves are
//! sorted lexicographically by raw content before hashing, so two builders
//! given the same set in any order produce the same root.
//!
//! Membership witnesses carry the full path (leaf hash first, then one
//! sibling per level) plus one position bit per level. The same replay
//! algorithm runs both here and inside the predicate over committed
//! witnesses.

use crate::error::Error;
use crate::hashing::{Hash, HashProfile};

/// Capability set required of tree contents: hashable and comparable.
///
/// Implementors only need to expose their raw bytes; hashing defers to the
/// tree's profile and equality defaults to byte equality.
pub trait LeafContent {
    fn content_bytes(&self) -> &[u8];

    fn compute_hash(&self, profile: HashProfile) -> Hash {
        profile.hash_leaf(self.content_bytes())
    }

    fn equals(&self, other: &Self) -> bool {
        self.content_bytes() == other.content_bytes()
    }
}

/// Plain byte-string leaf content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteLeaf(Vec<u8>);

impl ByteLeaf {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl LeafContent for ByteLeaf {
    fn content_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for ByteLeaf {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for ByteLeaf {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// An ordered, deduplicated collection of leaf contents.
///
/// Canonicalization happens on construction: contents are sorted by raw
/// bytes and duplicates (by [`LeafContent::equals`]) collapse to one entry.
/// Immutable afterwards.
#[derive(Debug, Clone)]
pub struct LeafSet<L: LeafContent> {
    leaves: Vec<L>,
}

impl<L: LeafContent> LeafSet<L> {
    pub fn new(mut leaves: Vec<L>) -> Self {
        leaves.sort_by(|a, b| a.content_bytes().cmp(b.content_bytes()));
        leaves.dedup_by(|a, b| a.equals(b));
        Self { leaves }
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, L> {
        self.leaves.iter()
    }
}

/// A membership witness for one leaf.
///
/// `path` has `depth + 1` entries: the leaf hash at index 0 followed by one
/// sibling per level, bottom-up. `position_bits[i]` is true iff the sibling
/// at level `i` lies to the RIGHT of the current node (the current node is
/// the left child).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleWitness {
    pub leaf_index: usize,
    pub path: Vec<Hash>,
    pub position_bits: Vec<bool>,
}

impl MerkleWitness {
    /// The leaf hash this witness opens.
    pub fn leaf_hash(&self) -> &Hash {
        &self.path[0]
    }

    /// The sibling hashes, bottom-up, without the leaf itself.
    pub fn siblings(&self) -> &[Hash] {
        &self.path[1..]
    }
}

/// A fixed-depth binary hash tree over a canonicalized leaf set.
///
/// Immutable once built; safe to share across concurrent proof requests.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    root: Hash,
    leaf_hashes: Vec<Hash>,
    leaf_count: usize,
    depth: usize,
    profile: HashProfile,
}

impl MerkleTree {
    /// Build a tree of exactly `2^depth` leaf slots from a leaf set.
    ///
    /// Fails if the set does not fit. Unused slots are filled with the
    /// profile's empty-leaf hash, so sparse sets of any size up to capacity
    /// produce well-defined roots.
    pub fn build<L: LeafContent>(
        leaves: &LeafSet<L>,
        profile: HashProfile,
        depth: usize,
    ) -> Result<Self, Error> {
        if depth == 0 || depth > 32 {
            return Err(Error::Construction(format!(
                "tree depth must be between 1 and 32, got {depth}"
            )));
        }
        let capacity = 1usize << depth;
        if leaves.len() > capacity {
            return Err(Error::Construction(format!(
                "{} leaves exceed capacity 2^{depth} = {capacity}",
                leaves.len()
            )));
        }

        let mut leaf_hashes: Vec<Hash> = leaves
            .iter()
            .map(|leaf| leaf.compute_hash(profile))
            .collect();
        leaf_hashes.resize(capacity, profile.empty_leaf());

        let root = compute_root(&leaf_hashes, profile);

        Ok(Self {
            root,
            leaf_count: leaves.len(),
            leaf_hashes,
            depth,
            profile,
        })
    }

    pub fn root(&self) -> &Hash {
        &self.root
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn profile(&self) -> HashProfile {
        self.profile
    }

    /// Number of real (non-padding) leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// The full padded leaf-hash layer.
    pub fn leaf_hashes(&self) -> &[Hash] {
        &self.leaf_hashes
    }

    /// Recompute every interior hash bottom-up and compare with the stored
    /// root. A post-construction self-check, not part of the proving path.
    pub fn verify(&self) -> bool {
        compute_root(&self.leaf_hashes, self.profile) == self.root
    }

    /// Extract a membership witness for the given leaf hash.
    ///
    /// Only real leaves are provable; padding slots yield
    /// [`Error::LeafNotFound`] even though their hashes sit in the layer.
    /// Works from the stored leaf-hash sequence alone, recomputing each
    /// level on the way up: O(N) work for an O(depth) witness.
    pub fn prove_membership(&self, leaf_hash: &Hash) -> Result<MerkleWitness, Error> {
        let leaf_index = self.leaf_hashes[..self.leaf_count]
            .iter()
            .position(|h| h == leaf_hash)
            .ok_or(Error::LeafNotFound)?;

        let mut level = self.leaf_hashes.clone();
        let mut index = leaf_index;
        let mut path = Vec::with_capacity(self.depth + 1);
        let mut position_bits = Vec::with_capacity(self.depth);
        path.push(level[index]);

        for _ in 0..self.depth {
            let is_left = index % 2 == 0;
            let sibling_index = if is_left { index + 1 } else { index - 1 };
            path.push(level[sibling_index]);
            position_bits.push(is_left);

            let mut next = Vec::with_capacity(level.len() / 2);
            for pair in level.chunks(2) {
                next.push(self.profile.hash_pair(&pair[0], &pair[1]));
            }
            level = next;
            index /= 2;
        }

        Ok(MerkleWitness {
            leaf_index,
            path,
            position_bits,
        })
    }
}

fn compute_root(leaf_hashes: &[Hash], profile: HashProfile) -> Hash {
    let mut level = leaf_hashes.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len() / 2);
        for pair in level.chunks(2) {
            next.push(profile.hash_pair(&pair[0], &pair[1]));
        }
        level = next;
    }
    level[0]
}

/// Replay a witness against a root.
///
/// Reconstructs the root from the witness's leaf hash and siblings, using
/// the position bits to order each pair, and cross-checks the bits against
/// `claimed_index`. Identical in semantics to the re-execution the predicate
/// performs over committed witnesses.
pub fn verify_membership(
    profile: HashProfile,
    root: &Hash,
    witness: &MerkleWitness,
    claimed_index: usize,
    total_leaves: usize,
) -> bool {
    if witness.path.len() != witness.position_bits.len() + 1 {
        return false;
    }
    if total_leaves == 0 || claimed_index >= total_leaves {
        return false;
    }
    if witness.leaf_index != claimed_index {
        return false;
    }

    let mut current = witness.path[0];
    let mut index = claimed_index;
    for (bit, sibling) in witness.position_bits.iter().zip(&witness.path[1..]) {
        let is_left = index % 2 == 0;
        if *bit != is_left {
            return false;
        }
        current = if is_left {
            profile.hash_pair(&current, sibling)
        } else {
            profile.hash_pair(sibling, &current)
        };
        index /= 2;
    }

    current == *root
}
