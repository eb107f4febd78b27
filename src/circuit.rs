//! The bid validity predicates.
//!
//! Two explicitly named shapes exist and are never toggled implicitly:
//!
//! - [`MembershipBidCircuit`]: the prover belongs to the pre-published
//!   anonymity set AND submits a valid non-zero bid bound to its hidden
//!   identity. Public inputs, in order: merkle root, nullifier, commitment,
//!   trapdoor, bid value.
//! - [`OpenBidCircuit`]: rooms without a pre-registered identity set; the
//!   membership constraint and the root input are absent. Public inputs:
//!   nullifier, commitment, trapdoor, bid value.
//!
//! Both shapes share the identity-binding sub-predicate
//! (`commitment = H2(user_id, private_code)` and
//! `trapdoor = H2(commitment, nullifier)`) and the non-zero-bid constraint.
//!
//! Public input order is the verifier's calling convention; reordering
//! inputs does not error, it verifies against a different statement and
//! fails.

use crate::error::Error;
use crate::hashing::poseidon_config;
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_ff::Field;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

fn poseidon_hash_var(
    cs: ConstraintSystemRef<Fr>,
    inputs: &[FpVar<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::<Fr>::new(cs, poseidon_config());
    sponge.absorb(&inputs.to_vec())?;
    let mut output = sponge.squeeze_field_elements(1)?;
    Ok(output.remove(0))
}

/// `value != 0`, enforced through an inverse witness: the prover must supply
/// `value^-1`, which does not exist for zero, so a zero assignment already
/// fails at synthesis.
fn enforce_nonzero(value: &FpVar<Fr>) -> Result<(), SynthesisError> {
    let inverse = FpVar::new_witness(value.cs(), || {
        value
            .value()?
            .inverse()
            .ok_or(SynthesisError::DivisionByZero)
    })?;
    value.mul_equals(&inverse, &FpVar::one())
}

/// The identity sub-predicate shared by both shapes.
fn enforce_identity_binding(
    cs: ConstraintSystemRef<Fr>,
    user_id: &FpVar<Fr>,
    private_code: &FpVar<Fr>,
    nullifier: &FpVar<Fr>,
    commitment: &FpVar<Fr>,
    trapdoor: &FpVar<Fr>,
) -> Result<(), SynthesisError> {
    let bound = poseidon_hash_var(cs.clone(), &[user_id.clone(), private_code.clone()])?;
    bound.enforce_equal(commitment)?;
    let disclosed = poseidon_hash_var(cs, &[bound, nullifier.clone()])?;
    disclosed.enforce_equal(trapdoor)
}

/// Full predicate: set membership plus identity binding plus non-zero bid.
#[derive(Debug, Clone, Default)]
pub struct MembershipBidCircuit {
    pub merkle_root: Option<Fr>,
    pub nullifier: Option<Fr>,
    pub commitment: Option<Fr>,
    pub trapdoor: Option<Fr>,
    pub bid_value: Option<Fr>,

    pub user_id: Option<Fr>,
    pub private_code: Option<Fr>,
    /// Sibling hashes, bottom-up, one per level.
    pub siblings: Vec<Option<Fr>>,
    /// `true` iff the sibling at that level lies to the right.
    pub position_bits: Vec<Option<bool>>,
}

impl MembershipBidCircuit {
    /// The unassigned circuit of a given depth, used for key generation.
    pub fn blank(depth: usize) -> Self {
        Self {
            siblings: vec![None; depth],
            position_bits: vec![None; depth],
            ..Self::default()
        }
    }

    /// The ordered public inputs of a fully assigned instance.
    pub fn public_inputs(&self) -> Result<Vec<Fr>, Error> {
        match (
            self.merkle_root,
            self.nullifier,
            self.commitment,
            self.trapdoor,
            self.bid_value,
        ) {
            (Some(root), Some(nullifier), Some(commitment), Some(trapdoor), Some(bid)) => {
                Ok(vec![root, nullifier, commitment, trapdoor, bid])
            }
            _ => Err(Error::Prove(
                "incomplete public assignment for membership bid".into(),
            )),
        }
    }
}

impl ConstraintSynthesizer<Fr> for MembershipBidCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        if self.siblings.is_empty() || self.siblings.len() != self.position_bits.len() {
            return Err(SynthesisError::Unsatisfiable);
        }

        let merkle_root = FpVar::new_input(cs.clone(), || {
            self.merkle_root.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let nullifier = FpVar::new_input(cs.clone(), || {
            self.nullifier.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let commitment = FpVar::new_input(cs.clone(), || {
            self.commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let trapdoor = FpVar::new_input(cs.clone(), || {
            self.trapdoor.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let bid_value = FpVar::new_input(cs.clone(), || {
            self.bid_value.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let user_id = FpVar::new_witness(cs.clone(), || {
            self.user_id.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let private_code = FpVar::new_witness(cs.clone(), || {
            self.private_code.ok_or(SynthesisError::AssignmentMissing)
        })?;

        enforce_nonzero(&bid_value)?;
        enforce_identity_binding(
            cs.clone(),
            &user_id,
            &private_code,
            &nullifier,
            &commitment,
            &trapdoor,
        )?;

        // Walk the committed path from the user's leaf preimage to the root.
        let mut current = poseidon_hash_var(cs.clone(), &[user_id])?;
        for (sibling_value, bit_value) in self.siblings.into_iter().zip(self.position_bits) {
            let sibling = FpVar::new_witness(cs.clone(), || {
                sibling_value.ok_or(SynthesisError::AssignmentMissing)
            })?;
            let sibling_on_right = Boolean::new_witness(cs.clone(), || {
                bit_value.ok_or(SynthesisError::AssignmentMissing)
            })?;

            let left = sibling_on_right.select(&current, &sibling)?;
            let right = sibling_on_right.select(&sibling, &current)?;
            current = poseidon_hash_var(cs.clone(), &[left, right])?;
        }

        current.enforce_equal(&merkle_root)
    }
}

/// Membership-free predicate for rooms without a registered identity set.
#[derive(Debug, Clone, Default)]
pub struct OpenBidCircuit {
    pub nullifier: Option<Fr>,
    pub commitment: Option<Fr>,
    pub trapdoor: Option<Fr>,
    pub bid_value: Option<Fr>,

    pub user_id: Option<Fr>,
    pub private_code: Option<Fr>,
}

impl OpenBidCircuit {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn public_inputs(&self) -> Result<Vec<Fr>, Error> {
        match (self.nullifier, self.commitment, self.trapdoor, self.bid_value) {
            (Some(nullifier), Some(commitment), Some(trapdoor), Some(bid)) => {
                Ok(vec![nullifier, commitment, trapdoor, bid])
            }
            _ => Err(Error::Prove(
                "incomplete public assignment for open bid".into(),
            )),
        }
    }
}

impl ConstraintSynthesizer<Fr> for OpenBidCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let nullifier = FpVar::new_input(cs.clone(), || {
            self.nullifier.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let commitment = FpVar::new_input(cs.clone(), || {
            self.commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let trapdoor = FpVar::new_input(cs.clone(), || {
            self.trapdoor.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let bid_value = FpVar::new_input(cs.clone(), || {
            self.bid_value.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let user_id = FpVar::new_witness(cs.clone(), || {
            self.user_id.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let private_code = FpVar::new_witness(cs.clone(), || {
            self.private_code.ok_or(SynthesisError::AssignmentMissing)
        })?;

        enforce_nonzero(&bid_value)?;
        enforce_identity_binding(
            cs,
            &user_id,
            &private_code,
            &nullifier,
            &commitment,
            &trapdoor,
        )
    }
}
