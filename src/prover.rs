//! Proof orchestration: one-time setup, key material, proving, verification.
//!
//! Key generation compiles a predicate shape exactly once; the resulting
//! [`KeyMaterial`] is a read-only capability shared across sessions and
//! reused for every subsequent prove/verify call. Setup is the single
//! expensive, blocking step and must complete before any proof is requested.

use crate::circuit::{MembershipBidCircuit, OpenBidCircuit};
use crate::error::Error;
use crate::types::ProofArtifact;
use crate::MERKLE_DEPTH;
use ark_bn254::{Bn254, Fr};
use ark_groth16::{
    prepare_verifying_key, Groth16, PreparedVerifyingKey, ProvingKey, VerifyingKey,
};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use log::{debug, error, info, warn};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The two compiled predicate shapes. Selection is always explicit; a
/// missing witness never silently downgrades a membership proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateShape {
    MembershipBid,
    OpenBid,
}

impl PredicateShape {
    /// Stable name, used to key exported key material.
    pub fn name(&self) -> &'static str {
        match self {
            PredicateShape::MembershipBid => "MembershipBid",
            PredicateShape::OpenBid => "OpenBid",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "MembershipBid" => Some(PredicateShape::MembershipBid),
            "OpenBid" => Some(PredicateShape::OpenBid),
            _ => None,
        }
    }

    /// Number of public inputs the shape declares, in their fixed order.
    pub fn public_input_len(&self) -> usize {
        match self {
            PredicateShape::MembershipBid => 5,
            PredicateShape::OpenBid => 4,
        }
    }
}

/// Opaque proving/verifying keys for one predicate shape, with the
/// verification key pre-processed once for repeated use.
pub struct KeyMaterial {
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
    prepared: PreparedVerifyingKey<Bn254>,
}

impl KeyMaterial {
    pub fn new(proving_key: ProvingKey<Bn254>, verifying_key: VerifyingKey<Bn254>) -> Self {
        let prepared = prepare_verifying_key(&verifying_key);
        Self {
            proving_key,
            verifying_key,
            prepared,
        }
    }

    fn to_entry(&self) -> Result<KeyEntry, Error> {
        let mut pk_bytes = Vec::new();
        self.proving_key
            .serialize_compressed(&mut pk_bytes)
            .map_err(|e| Error::KeyEncoding(e.to_string()))?;
        let mut vk_bytes = Vec::new();
        self.verifying_key
            .serialize_compressed(&mut vk_bytes)
            .map_err(|e| Error::KeyEncoding(e.to_string()))?;
        Ok(KeyEntry {
            proving_key: hex::encode(pk_bytes),
            verifying_key: hex::encode(vk_bytes),
        })
    }

    fn from_entry(entry: &KeyEntry) -> Result<Self, Error> {
        let pk_bytes = hex::decode(&entry.proving_key)
            .map_err(|e| Error::KeyEncoding(format!("proving key is not valid hex: {e}")))?;
        let vk_bytes = hex::decode(&entry.verifying_key)
            .map_err(|e| Error::KeyEncoding(format!("verifying key is not valid hex: {e}")))?;
        let proving_key = ProvingKey::<Bn254>::deserialize_compressed(pk_bytes.as_slice())
            .map_err(|e| Error::KeyEncoding(format!("proving key does not decode: {e}")))?;
        let verifying_key = VerifyingKey::<Bn254>::deserialize_compressed(vk_bytes.as_slice())
            .map_err(|e| Error::KeyEncoding(format!("verifying key does not decode: {e}")))?;
        Ok(Self::new(proving_key, verifying_key))
    }
}

/// A fully assigned predicate instance, tagged by shape.
#[derive(Debug, Clone)]
pub enum BidAssignment {
    Membership(MembershipBidCircuit),
    Open(OpenBidCircuit),
}

impl BidAssignment {
    pub fn shape(&self) -> PredicateShape {
        match self {
            BidAssignment::Membership(_) => PredicateShape::MembershipBid,
            BidAssignment::Open(_) => PredicateShape::OpenBid,
        }
    }

    pub fn public_inputs(&self) -> Result<Vec<Fr>, Error> {
        match self {
            BidAssignment::Membership(circuit) => circuit.public_inputs(),
            BidAssignment::Open(circuit) => circuit.public_inputs(),
        }
    }
}

/// Prover/verifier for one predicate shape with cached key material.
pub struct BidProver {
    shape: PredicateShape,
    keys: Arc<KeyMaterial>,
}

impl BidProver {
    /// One-time trusted setup for a shape. Expensive; never on the request
    /// hot path. Failures abort startup.
    pub fn setup<R: RngCore + CryptoRng>(
        shape: PredicateShape,
        rng: &mut R,
    ) -> Result<Self, Error> {
        info!("running one-time setup for predicate shape {}", shape.name());
        let proving_key = match shape {
            PredicateShape::MembershipBid => {
                Groth16::<Bn254>::generate_random_parameters_with_reduction(
                    MembershipBidCircuit::blank(MERKLE_DEPTH),
                    rng,
                )
            }
            PredicateShape::OpenBid => {
                Groth16::<Bn254>::generate_random_parameters_with_reduction(
                    OpenBidCircuit::blank(),
                    rng,
                )
            }
        }
        .map_err(Error::Setup)?;
        let verifying_key = proving_key.vk.clone();
        info!("setup for {} complete", shape.name());
        Ok(Self {
            shape,
            keys: Arc::new(KeyMaterial::new(proving_key, verifying_key)),
        })
    }

    /// Wrap previously generated key material. No compilation happens.
    pub fn from_key_material(shape: PredicateShape, keys: KeyMaterial) -> Self {
        Self {
            shape,
            keys: Arc::new(keys),
        }
    }

    pub fn shape(&self) -> PredicateShape {
        self.shape
    }

    pub fn key_material(&self) -> &Arc<KeyMaterial> {
        &self.keys
    }

    /// Produce a proof for a fully assigned instance and self-verify it
    /// before returning.
    ///
    /// A self-verification failure means the compiled predicate and the
    /// witness assignment disagree. That is a programmer error, surfaced
    /// loudly as [`Error::ProofSelfCheck`]; it is never retried and never
    /// reported as a plain invalid proof.
    pub fn prove<R: RngCore + CryptoRng>(
        &self,
        assignment: BidAssignment,
        rng: &mut R,
    ) -> Result<ProofArtifact, Error> {
        if assignment.shape() != self.shape {
            return Err(Error::Prove(format!(
                "assignment for shape {} handed to a {} prover",
                assignment.shape().name(),
                self.shape.name()
            )));
        }
        let public_inputs = assignment.public_inputs()?;

        debug!("proving shape {}", self.shape.name());
        let proof = match assignment {
            BidAssignment::Membership(circuit) => {
                Groth16::<Bn254>::create_random_proof_with_reduction(
                    circuit,
                    &self.keys.proving_key,
                    rng,
                )
            }
            BidAssignment::Open(circuit) => Groth16::<Bn254>::create_random_proof_with_reduction(
                circuit,
                &self.keys.proving_key,
                rng,
            ),
        }
        .map_err(|e| Error::Prove(e.to_string()))?;

        let self_check = Groth16::<Bn254>::verify_proof(&self.keys.prepared, &proof, &public_inputs)
            .map_err(|e| Error::Prove(e.to_string()))?;
        if !self_check {
            error!(
                "proof for shape {} failed self-verification; predicate/witness mismatch",
                self.shape.name()
            );
            return Err(Error::ProofSelfCheck {
                shape: self.shape.name(),
            });
        }
        debug!("proof for shape {} self-verified", self.shape.name());

        Ok(ProofArtifact::from_groth16(&proof, &public_inputs))
    }

    /// Verify an artifact against the public inputs bound into it.
    pub fn verify(&self, artifact: &ProofArtifact) -> Result<bool, Error> {
        let public_inputs = artifact.public_field_inputs()?;
        self.verify_with_inputs(artifact, &public_inputs)
    }

    /// Verify an artifact against caller-supplied public inputs.
    ///
    /// Returns `Ok(false)` for a well-formed proof that does not verify.
    /// Structurally broken data (wrong arity, bad field widths, off-curve
    /// points) is a distinct error and never a silent `false`.
    pub fn verify_with_inputs(
        &self,
        artifact: &ProofArtifact,
        public_inputs: &[Fr],
    ) -> Result<bool, Error> {
        if public_inputs.len() != self.shape.public_input_len() {
            return Err(Error::MalformedInputs(format!(
                "shape {} expects {} public inputs, got {}",
                self.shape.name(),
                self.shape.public_input_len(),
                public_inputs.len()
            )));
        }
        let proof = artifact.to_groth16()?;
        match Groth16::<Bn254>::verify_proof(&self.keys.prepared, &proof, public_inputs) {
            Ok(valid) => Ok(valid),
            Err(e) => {
                // Adversarial bytes must not escalate past a failed check.
                warn!("verification errored, treating as invalid: {e}");
                Ok(false)
            }
        }
    }
}

/// One shape's exported keys, hex-encoded for text transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEntry {
    pub proving_key: String,
    pub verifying_key: String,
}

/// Name-keyed key material for all compiled shapes.
///
/// Serialized as a JSON object `{ "<shape name>": { provingKey, verifyingKey
/// } }`, loaded once at process start and cached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyStore {
    #[serde(flatten)]
    entries: BTreeMap<String, KeyEntry>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, shape: PredicateShape, keys: &KeyMaterial) -> Result<(), Error> {
        self.entries
            .insert(shape.name().to_string(), keys.to_entry()?);
        Ok(())
    }

    pub fn contains(&self, shape: PredicateShape) -> bool {
        self.entries.contains_key(shape.name())
    }

    /// Decode a shape's keys into a ready prover.
    pub fn load_prover(&self, shape: PredicateShape) -> Result<BidProver, Error> {
        let entry = self.entries.get(shape.name()).ok_or_else(|| {
            Error::KeyEncoding(format!("no key material for shape {}", shape.name()))
        })?;
        let keys = KeyMaterial::from_entry(entry)?;
        Ok(BidProver::from_key_material(shape, keys))
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }
}
