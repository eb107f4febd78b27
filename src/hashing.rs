//! Hash profiles and byte/field codecs.
//!
//! Two hash primitives coexist in this system and must never be mixed within
//! one tree:
//!
//! - [`HashProfile::CircuitFriendly`]: Poseidon over the BN254 scalar field,
//!   cheap to re-execute inside the predicate. Every tree that feeds a
//!   zero-knowledge proof uses this profile.
//! - [`HashProfile::GeneralPurpose`]: Keccak-256, matching the on-chain
//!   registry verifier. Trees with this profile are checked publicly and
//!   never enter a circuit.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{
    find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge,
};
use ark_crypto_primitives::sponge::{CryptographicSponge, FieldBasedCryptographicSponge};
use ark_ff::{BigInteger, PrimeField};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::sync::OnceLock;

pub const HASH_SIZE: usize = 32;

/// A 32-byte hash value, the uniform node type of every tree.
pub type Hash = [u8; HASH_SIZE];

const POSEIDON_RATE: usize = 3;
const POSEIDON_FULL_ROUNDS: u64 = 8;
const POSEIDON_PARTIAL_ROUNDS: u64 = 56;
const POSEIDON_ALPHA: u64 = 5;

/// Poseidon parameters shared by native hashing and the in-circuit gadget.
///
/// Generating the round constants involves matrix inversions, so the table is
/// computed once and reused; tree construction hashes every leaf and every
/// interior node through it.
pub fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    static CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();
    CONFIG.get_or_init(|| {
        let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
            Fr::MODULUS_BIT_SIZE as u64,
            POSEIDON_RATE,
            POSEIDON_FULL_ROUNDS,
            POSEIDON_PARTIAL_ROUNDS,
            0,
        );
        PoseidonConfig::new(
            POSEIDON_FULL_ROUNDS as usize,
            POSEIDON_PARTIAL_ROUNDS as usize,
            POSEIDON_ALPHA,
            mds,
            ark,
            POSEIDON_RATE,
            1,
        )
    })
}

/// Poseidon hash of a sequence of field elements.
///
/// The native counterpart of the in-circuit sponge: both sides absorb the
/// same inputs and squeeze one native element, so a value hashed here equals
/// the value the predicate recomputes over committed witnesses.
pub fn poseidon_hash(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::<Fr>::new(poseidon_config());
    sponge.absorb(&inputs.to_vec());
    sponge.squeeze_native_field_elements(1)[0]
}

/// Keccak-256 of raw bytes.
pub fn keccak256(data: &[u8]) -> Hash {
    Keccak256::digest(data).into()
}

/// Reduce big-endian bytes to a BN254 scalar.
pub fn bytes_to_field(bytes: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

/// Encode a BN254 scalar as 32 big-endian bytes.
pub fn field_to_bytes(value: &Fr) -> Hash {
    let repr = value.into_bigint().to_bytes_be();
    let mut out = [0u8; HASH_SIZE];
    out[HASH_SIZE - repr.len()..].copy_from_slice(&repr);
    out
}

/// Selects the hash primitive used for every leaf and interior node of a
/// [`crate::merkle::MerkleTree`]. A tree carries exactly one profile for its
/// whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashProfile {
    /// Poseidon over BN254, re-executable inside the predicate.
    CircuitFriendly,
    /// Keccak-256, for trees checked publicly on chain.
    GeneralPurpose,
}

impl HashProfile {
    /// Hash raw leaf content into a leaf node.
    pub fn hash_leaf(&self, content: &[u8]) -> Hash {
        match self {
            HashProfile::CircuitFriendly => {
                field_to_bytes(&poseidon_hash(&[bytes_to_field(content)]))
            }
            HashProfile::GeneralPurpose => keccak256(content),
        }
    }

    /// Hash an ordered pair of child nodes into their parent.
    pub fn hash_pair(&self, left: &Hash, right: &Hash) -> Hash {
        match self {
            HashProfile::CircuitFriendly => field_to_bytes(&poseidon_hash(&[
                bytes_to_field(left),
                bytes_to_field(right),
            ])),
            HashProfile::GeneralPurpose => {
                let mut hasher = Keccak256::new();
                hasher.update(left);
                hasher.update(right);
                hasher.finalize().into()
            }
        }
    }

    /// The canonical hash filling unused leaf slots.
    pub fn empty_leaf(&self) -> Hash {
        self.hash_leaf(&[])
    }
}

impl fmt::Display for HashProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashProfile::CircuitFriendly => write!(f, "circuit-friendly"),
            HashProfile::GeneralPurpose => write!(f, "general-purpose"),
        }
    }
}
