//! Error types for the anonymous bidding system.

use ark_relations::r1cs::SynthesisError;
use thiserror::Error;

/// Errors that can occur across the accumulator, predicate, and session layers.
///
/// Verification keeps two distinct failure channels: a well-formed proof that
/// simply does not verify yields `Ok(false)` from the verifying call, while
/// structurally broken input (wrong field widths, off-curve points, wrong
/// public-input arity) yields [`Error::MalformedProof`] or
/// [`Error::MalformedInputs`]. [`Error::ProofSelfCheck`] is never folded into
/// either: it signals a predicate/witness bug on the proving side.
#[derive(Debug, Error)]
pub enum Error {
    #[error("merkle construction failed: {0}")]
    Construction(String),

    #[error("leaf is not present in the tree")]
    LeafNotFound,

    #[error("predicate setup failed: {0}")]
    Setup(SynthesisError),

    #[error("proving failed: {0}")]
    Prove(String),

    #[error(
        "freshly produced proof failed self-verification for shape {shape}; \
         the compiled predicate and the witness assignment disagree"
    )]
    ProofSelfCheck { shape: &'static str },

    #[error("malformed proof: {0}")]
    MalformedProof(String),

    #[error("malformed public inputs: {0}")]
    MalformedInputs(String),

    #[error("session is not ready; call init_session first")]
    SessionNotReady,

    #[error("key material encoding failed: {0}")]
    KeyEncoding(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}
