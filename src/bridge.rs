//! Host-bridge surface: pure functions over hex strings and JSON.
//!
//! Narrow equivalents of the browser/host entry points, callable without any
//! particular host runtime attached. The session is an explicit handle on
//! every call; there is no ambient "current session".

use crate::error::Error;
use crate::hashing::{bytes_to_field, field_to_bytes, poseidon_hash};
use crate::prover::BidProver;
use crate::session::BiddingSession;
use crate::types::BidProofBundle;
use rand::{CryptoRng, RngCore};

/// Strip an optional `0x`/`0X` prefix and surrounding whitespace, then check
/// the remainder is non-empty, even-length hex.
pub fn validate_and_strip_hex(input: &str) -> Result<String, Error> {
    let trimmed = input.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if stripped.is_empty() {
        return Err(Error::MalformedInputs("hex input is empty".into()));
    }
    if stripped.len() % 2 != 0 {
        return Err(Error::MalformedInputs(format!(
            "hex input has odd length {}",
            stripped.len()
        )));
    }
    if !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::MalformedInputs(
            "hex input contains non-hex characters".into(),
        ));
    }
    Ok(stripped.to_string())
}

/// Circuit-friendly hash of hex-encoded bytes, returned as hex.
pub fn hash_hex(input: &str) -> Result<String, Error> {
    let stripped = validate_and_strip_hex(input)?;
    let bytes = hex::decode(stripped).map_err(|e| Error::MalformedInputs(e.to_string()))?;
    let digest = poseidon_hash(&[bytes_to_field(&bytes)]);
    Ok(hex::encode(field_to_bytes(&digest)))
}

/// Produce a membership bid proof and serialize the transport bundle.
pub fn generate_proof_json<R: RngCore + CryptoRng>(
    session: &BiddingSession,
    bid_value: u64,
    rng: &mut R,
) -> Result<String, Error> {
    let artifact = session.get_proof(bid_value, rng)?;
    let bundle = BidProofBundle::from_artifact(session.prover().shape(), artifact)?;
    serde_json::to_string_pretty(&bundle).map_err(|e| Error::Serialization(e.to_string()))
}

/// Parse, validate, and verify a serialized proof bundle.
///
/// Returns `Ok(false)` for an honest-but-invalid proof; malformed bundles
/// and shape mismatches error distinctly.
pub fn verify_proof_json(prover: &BidProver, json: &str) -> Result<bool, Error> {
    let bundle: BidProofBundle = serde_json::from_str(json)
        .map_err(|e| Error::MalformedProof(format!("bundle does not parse: {e}")))?;
    bundle.validate()?;
    if bundle.shape()? != prover.shape() {
        return Err(Error::MalformedInputs(format!(
            "bundle shape {} does not match the loaded {} keys",
            bundle.shape,
            prover.shape().name()
        )));
    }
    prover.verify(&bundle.proof)
}
