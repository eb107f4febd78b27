//! Anonymous bidding with zero-knowledge set-membership proofs.
//!
//! Registered participants prove, in zero knowledge, that they belong to a
//! pre-published anonymity set and are submitting exactly one valid non-zero
//! bid per round, without revealing which participant they are. Rounds are
//! unlinkable except through the intentionally exposed per-round nullifier.
//!
//! # Components
//!
//! - [`MerkleTree`]: fixed-depth accumulator over the anonymity set
//! - [`derive_user_id`]/[`PublicBinding`]: identity, commitment, and
//!   nullifier protocol
//! - [`MembershipBidCircuit`]/[`OpenBidCircuit`]: the two predicate shapes
//! - [`BidProver`]: setup, proving with self-verification, verification
//! - [`BiddingSession`]: per-participant state machine
//! - [`ProofArtifact`]/[`BidProofBundle`]: the proof wire format
//!
//! # Example
//!
//! ```no_run
//! use zk_bidding::{BidProver, BiddingSession, PredicateShape, MERKLE_DEPTH};
//! ```

pub mod bridge;
pub mod circuit;
pub mod config;
pub mod error;
pub mod hashing;
pub mod identity;
pub mod merkle;
pub mod onchain;
pub mod prover;
pub mod session;
pub mod types;


pub use circuit::{MembershipBidCircuit, OpenBidCircuit};
pub use error::Error;
pub use hashing::{bytes_to_field, field_to_bytes, poseidon_hash, Hash, HashProfile, HASH_SIZE};
pub use identity::{
    commitment, derive_user_id, leaf_preimage, refresh_nullifier, trapdoor, PublicBinding,
    SecretMaterial,
};
pub use merkle::{verify_membership, ByteLeaf, LeafContent, LeafSet, MerkleTree, MerkleWitness};
pub use prover::{BidAssignment, BidProver, KeyMaterial, KeyStore, PredicateShape};
pub use session::BiddingSession;
pub use types::{BidProofBundle, ProofArtifact};

/// Depth of every membership tree the compiled predicate accepts.
///
/// The membership circuit re-executes exactly this many hash levels, so the
/// value is baked into the proving and verifying keys: changing it requires
/// regenerating all key material, and prover and verifier must agree on it
/// or verification fails.
///
/// A depth of 10 admits up to 2^10 = 1024 registered participants per room.
/// Each additional level doubles capacity at the cost of one more in-circuit
/// hash per proof.
pub const MERKLE_DEPTH: usize = 10;
