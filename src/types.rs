//! Wire types: the proof artifact and its transport envelope.

use crate::error::Error;
use crate::hashing::{field_to_bytes, HASH_SIZE};
use crate::prover::PredicateShape;
use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{BigInteger, PrimeField};
use ark_groth16::Proof;
use serde::{Deserialize, Serialize};

/// Hex characters in one encoded field element.
pub const FIELD_HEX_LENGTH: usize = 2 * HASH_SIZE;

/// A produced proof plus the ordered public inputs bound into it.
///
/// `a` and `c` are affine G1 points as `[x, y]`; `b` is an affine G2 point
/// as `[[x.c0, x.c1], [y.c0, y.c1]]`. Every element is a 32-byte big-endian
/// hex string. This decomposition is the exact calling convention of the
/// on-chain verifier: `verify(public_inputs, a, b, c)` with the inputs in
/// the order recorded here. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifact {
    pub a: [String; 2],
    pub b: [[String; 2]; 2],
    pub c: [String; 2],
    pub public_inputs: Vec<String>,
}

fn fq_to_hex(value: &Fq) -> String {
    let repr = value.into_bigint().to_bytes_be();
    let mut out = [0u8; HASH_SIZE];
    out[HASH_SIZE - repr.len()..].copy_from_slice(&repr);
    hex::encode(out)
}

fn fr_to_hex(value: &Fr) -> String {
    hex::encode(field_to_bytes(value))
}

fn decode_element(label: &str, input: &str) -> Result<[u8; HASH_SIZE], Error> {
    if input.len() != FIELD_HEX_LENGTH {
        return Err(Error::MalformedProof(format!(
            "{label} must be {FIELD_HEX_LENGTH} hex characters, got {}",
            input.len()
        )));
    }
    let bytes = hex::decode(input)
        .map_err(|e| Error::MalformedProof(format!("{label} is not valid hex: {e}")))?;
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&bytes);
    Ok(out)
}

fn parse_fq(label: &str, input: &str) -> Result<Fq, Error> {
    Ok(Fq::from_be_bytes_mod_order(&decode_element(label, input)?))
}

fn g1_from_coords(label: &str, coords: &[String; 2]) -> Result<G1Affine, Error> {
    let x = parse_fq(label, &coords[0])?;
    let y = parse_fq(label, &coords[1])?;
    let point = G1Affine::new_unchecked(x, y);
    if point.is_zero() || !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve()
    {
        return Err(Error::MalformedProof(format!(
            "{label} is not a valid curve point"
        )));
    }
    Ok(point)
}

fn g2_from_coords(label: &str, coords: &[[String; 2]; 2]) -> Result<G2Affine, Error> {
    let x = Fq2::new(
        parse_fq(label, &coords[0][0])?,
        parse_fq(label, &coords[0][1])?,
    );
    let y = Fq2::new(
        parse_fq(label, &coords[1][0])?,
        parse_fq(label, &coords[1][1])?,
    );
    let point = G2Affine::new_unchecked(x, y);
    if point.is_zero() || !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve()
    {
        return Err(Error::MalformedProof(format!(
            "{label} is not a valid curve point"
        )));
    }
    Ok(point)
}

impl ProofArtifact {
    /// Decompose a Groth16 proof and bind the ordered public inputs.
    pub fn from_groth16(proof: &Proof<Bn254>, public_inputs: &[Fr]) -> Self {
        Self {
            a: [fq_to_hex(&proof.a.x), fq_to_hex(&proof.a.y)],
            b: [
                [fq_to_hex(&proof.b.x.c0), fq_to_hex(&proof.b.x.c1)],
                [fq_to_hex(&proof.b.y.c0), fq_to_hex(&proof.b.y.c1)],
            ],
            c: [fq_to_hex(&proof.c.x), fq_to_hex(&proof.c.y)],
            public_inputs: public_inputs.iter().map(fr_to_hex).collect(),
        }
    }

    /// Reconstruct the Groth16 proof, rejecting anything that is not a
    /// well-formed point on the curve. Never panics on adversarial input.
    pub fn to_groth16(&self) -> Result<Proof<Bn254>, Error> {
        Ok(Proof {
            a: g1_from_coords("proof.a", &self.a)?,
            b: g2_from_coords("proof.b", &self.b)?,
            c: g1_from_coords("proof.c", &self.c)?,
        })
    }

    /// Decode the bound public inputs back into field elements.
    pub fn public_field_inputs(&self) -> Result<Vec<Fr>, Error> {
        self.public_inputs
            .iter()
            .enumerate()
            .map(|(i, input)| {
                decode_element(&format!("public input {i}"), input)
                    .map_err(|_| {
                        Error::MalformedInputs(format!(
                            "public input {i} must be a {FIELD_HEX_LENGTH}-character hex string"
                        ))
                    })
                    .map(|bytes| Fr::from_be_bytes_mod_order(&bytes))
            })
            .collect()
    }
}

// Bundles older than a day are stale; small clock skew is tolerated.
const TIMESTAMP_TOLERANCE_SECS: u64 = 30;
const TIMESTAMP_MAX_AGE_SECS: u64 = 86_400;

/// Transport envelope for one bid proof.
///
/// Redundantly exposes the root and nullifier so relayers can route and
/// ledger proofs without decoding the artifact; `validate` checks that the
/// envelope fields agree with the public inputs actually bound into the
/// proof. The leaf index is deliberately absent: publishing it would narrow
/// the anonymity set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidProofBundle {
    /// Predicate shape name, keying the verifying key to use.
    pub shape: String,
    /// Merkle root as hex; present only for the membership shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merkle_root: Option<String>,
    /// Per-round nullifier as hex.
    pub nullifier: String,
    pub proof: ProofArtifact,
    /// Unix timestamp of proof generation.
    pub timestamp: u64,
}

impl BidProofBundle {
    /// Wrap a freshly produced artifact. The envelope fields are copied out
    /// of the artifact's own public inputs, so they cannot disagree.
    pub fn from_artifact(shape: PredicateShape, proof: ProofArtifact) -> Result<Self, Error> {
        if proof.public_inputs.len() != shape.public_input_len() {
            return Err(Error::MalformedInputs(format!(
                "shape {} binds {} public inputs, artifact carries {}",
                shape.name(),
                shape.public_input_len(),
                proof.public_inputs.len()
            )));
        }
        let (merkle_root, nullifier) = match shape {
            PredicateShape::MembershipBid => (
                Some(proof.public_inputs[0].clone()),
                proof.public_inputs[1].clone(),
            ),
            PredicateShape::OpenBid => (None, proof.public_inputs[0].clone()),
        };
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| Error::Serialization(format!("system clock unavailable: {e}")))?
            .as_secs();
        Ok(Self {
            shape: shape.name().to_string(),
            merkle_root,
            nullifier,
            proof,
            timestamp,
        })
    }

    pub fn shape(&self) -> Result<PredicateShape, Error> {
        PredicateShape::from_name(&self.shape).ok_or_else(|| {
            Error::MalformedInputs(format!("unknown predicate shape '{}'", self.shape))
        })
    }

    /// Structural and consistency validation of an untrusted bundle.
    ///
    /// Checks shape, input arity, hex widths of every element, timestamp
    /// bounds, and agreement between the envelope and the bound inputs.
    /// Does not verify the proof itself.
    pub fn validate(&self) -> Result<(), Error> {
        let shape = self.shape()?;

        if self.proof.public_inputs.len() != shape.public_input_len() {
            return Err(Error::MalformedInputs(format!(
                "shape {} expects {} public inputs, got {}",
                self.shape,
                shape.public_input_len(),
                self.proof.public_inputs.len()
            )));
        }

        for (label, element) in self.elements() {
            decode_element(label, element)?;
        }

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| Error::Serialization(format!("system clock unavailable: {e}")))?
            .as_secs();
        if self.timestamp > now + TIMESTAMP_TOLERANCE_SECS {
            return Err(Error::MalformedInputs(format!(
                "timestamp {} is in the future (now {now})",
                self.timestamp
            )));
        }
        if now > self.timestamp + TIMESTAMP_MAX_AGE_SECS {
            return Err(Error::MalformedInputs(format!(
                "timestamp {} is older than {TIMESTAMP_MAX_AGE_SECS}s (now {now})",
                self.timestamp
            )));
        }

        match shape {
            PredicateShape::MembershipBid => {
                let root = self.merkle_root.as_deref().ok_or_else(|| {
                    Error::MalformedInputs("membership bundle is missing the merkle root".into())
                })?;
                decode_element("merkle_root", root)?;
                if root != self.proof.public_inputs[0] {
                    return Err(Error::MalformedInputs(
                        "merkle root disagrees with the bound public inputs".into(),
                    ));
                }
                if self.nullifier != self.proof.public_inputs[1] {
                    return Err(Error::MalformedInputs(
                        "nullifier disagrees with the bound public inputs".into(),
                    ));
                }
            }
            PredicateShape::OpenBid => {
                if self.merkle_root.is_some() {
                    return Err(Error::MalformedInputs(
                        "open-bid bundle must not carry a merkle root".into(),
                    ));
                }
                if self.nullifier != self.proof.public_inputs[0] {
                    return Err(Error::MalformedInputs(
                        "nullifier disagrees with the bound public inputs".into(),
                    ));
                }
            }
        }

        decode_element("nullifier", &self.nullifier)?;
        log::debug!("bundle for shape {} validated", self.shape);
        Ok(())
    }

    fn elements(&self) -> Vec<(&'static str, &String)> {
        let mut out = vec![
            ("proof.a.x", &self.proof.a[0]),
            ("proof.a.y", &self.proof.a[1]),
            ("proof.b.x.c0", &self.proof.b[0][0]),
            ("proof.b.x.c1", &self.proof.b[0][1]),
            ("proof.b.y.c0", &self.proof.b[1][0]),
            ("proof.b.y.c1", &self.proof.b[1][1]),
            ("proof.c.x", &self.proof.c[0]),
            ("proof.c.y", &self.proof.c[1]),
        ];
        for input in &self.proof.public_inputs {
            out.push(("public input", input));
        }
        out
    }
}
