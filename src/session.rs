//! Bidding session lifecycle.
//!
//! A session is an explicit handle owned by the caller; the crate keeps no
//! process-wide mutable state. Lifecycle:
//!
//! ```text
//! Uninitialized --init_session--> Ready
//! Ready --renew_session--> Ready   (fresh nullifier/trapdoor, same room)
//! Ready --join_room------> Ready   (new room, implies renew_session)
//! ```
//!
//! `get_proof` never changes session state and may be called repeatedly;
//! everything except `init_session` fails with
//! [`Error::SessionNotReady`] while uninitialized.

use crate::circuit::MembershipBidCircuit;
use crate::error::Error;
use crate::hashing::{bytes_to_field, HashProfile};
use crate::identity::{derive_user_id, leaf_preimage, PublicBinding, SecretMaterial};
use crate::merkle::MerkleTree;
use crate::prover::{BidAssignment, BidProver, PredicateShape};
use crate::types::ProofArtifact;
use crate::MERKLE_DEPTH;
use ark_bn254::Fr;
use log::debug;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;

struct ReadyState {
    room_id: u64,
    username: String,
    user_id: Fr,
    secret: SecretMaterial,
    binding: PublicBinding,
}

impl ReadyState {
    fn rebind(&mut self) {
        self.user_id = derive_user_id(&self.username, self.room_id);
        self.binding = PublicBinding::derive(&self.user_id, &self.secret);
    }
}

/// One participant's bidding state over a shared anonymity set.
///
/// Owns its mutable secrets; the tree and key material are shared read-only.
/// Not meant to be driven by more than one logical caller at a time.
pub struct BiddingSession {
    tree: Arc<MerkleTree>,
    prover: Arc<BidProver>,
    state: Option<ReadyState>,
}

impl BiddingSession {
    /// Create an uninitialized session over a tree and compiled keys.
    ///
    /// The tree must use the circuit-friendly profile and match the
    /// predicate's fixed depth; both are checked here so that a
    /// profile/shape mismatch can never surface later as a proof that
    /// silently fails to verify.
    pub fn new(tree: Arc<MerkleTree>, prover: Arc<BidProver>) -> Result<Self, Error> {
        if tree.profile() != HashProfile::CircuitFriendly {
            return Err(Error::Construction(format!(
                "bidding sessions require a circuit-friendly tree, got {}",
                tree.profile()
            )));
        }
        if tree.depth() != MERKLE_DEPTH {
            return Err(Error::Construction(format!(
                "tree depth {} does not match the compiled predicate depth {MERKLE_DEPTH}",
                tree.depth()
            )));
        }
        if prover.shape() != PredicateShape::MembershipBid {
            return Err(Error::Construction(format!(
                "bidding sessions require {} keys, got {}",
                PredicateShape::MembershipBid.name(),
                prover.shape().name()
            )));
        }
        Ok(Self {
            tree,
            prover,
            state: None,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    fn ready(&self) -> Result<&ReadyState, Error> {
        self.state.as_ref().ok_or(Error::SessionNotReady)
    }

    fn ready_mut(&mut self) -> Result<&mut ReadyState, Error> {
        self.state.as_mut().ok_or(Error::SessionNotReady)
    }

    /// Move to Ready: derive the user id, draw a nullifier, and compute the
    /// public binding.
    pub fn init_session<R: RngCore + CryptoRng>(
        &mut self,
        room_id: u64,
        username: &str,
        private_code: Fr,
        rng: &mut R,
    ) -> Result<(), Error> {
        let secret = SecretMaterial::generate(private_code, rng);
        let user_id = derive_user_id(username, room_id);
        let binding = PublicBinding::derive(&user_id, &secret);
        debug!("session initialized for room {room_id}");
        self.state = Some(ReadyState {
            room_id,
            username: username.to_string(),
            user_id,
            secret,
            binding,
        });
        Ok(())
    }

    /// Draw a fresh nullifier and recompute the trapdoor. The commitment is
    /// untouched. Mandatory before every new public disclosure.
    pub fn renew_session<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<(), Error> {
        let state = self.ready_mut()?;
        state.secret.refresh(rng);
        state.rebind();
        Ok(())
    }

    /// Switch rooms. The user id depends on the room, so the commitment is
    /// re-derived; the nullifier is refreshed as in `renew_session`.
    pub fn join_room<R: RngCore + CryptoRng>(
        &mut self,
        room_id: u64,
        rng: &mut R,
    ) -> Result<(), Error> {
        let state = self.ready_mut()?;
        state.room_id = room_id;
        state.secret.refresh(rng);
        state.rebind();
        debug!("session joined room {room_id}");
        Ok(())
    }

    pub fn room_id(&self) -> Result<u64, Error> {
        Ok(self.ready()?.room_id)
    }

    pub fn public_binding(&self) -> Result<PublicBinding, Error> {
        Ok(self.ready()?.binding)
    }

    pub fn nullifier(&self) -> Result<Fr, Error> {
        Ok(self.ready()?.secret.nullifier)
    }

    pub fn tree(&self) -> &Arc<MerkleTree> {
        &self.tree
    }

    pub fn prover(&self) -> &Arc<BidProver> {
        &self.prover
    }

    /// Produce a membership bid proof for `bid_value`.
    ///
    /// Extracts the caller's membership witness, assembles the predicate
    /// assignment, and proves. Does not change session state. A zero bid
    /// cannot satisfy the predicate and fails here.
    pub fn get_proof<R: RngCore + CryptoRng>(
        &self,
        bid_value: u64,
        rng: &mut R,
    ) -> Result<ProofArtifact, Error> {
        let state = self.ready()?;

        let leaf = leaf_preimage(&state.user_id, self.tree.profile());
        let witness = self.tree.prove_membership(&leaf)?;

        let circuit = MembershipBidCircuit {
            merkle_root: Some(bytes_to_field(self.tree.root())),
            nullifier: Some(state.secret.nullifier),
            commitment: Some(state.binding.commitment),
            trapdoor: Some(state.binding.trapdoor),
            bid_value: Some(Fr::from(bid_value)),
            user_id: Some(state.user_id),
            private_code: Some(state.secret.private_code),
            siblings: witness
                .siblings()
                .iter()
                .map(|s| Some(bytes_to_field(s)))
                .collect(),
            position_bits: witness.position_bits.iter().copied().map(Some).collect(),
        };

        self.prover.prove(BidAssignment::Membership(circuit), rng)
    }

    /// Verify an artifact against this session's compiled keys.
    pub fn verify_proof(&self, artifact: &ProofArtifact) -> Result<bool, Error> {
        self.ready()?;
        self.prover.verify(artifact)
    }
}
