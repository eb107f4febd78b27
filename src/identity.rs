//! Identity, commitment, and nullifier protocol.
//!
//! A participant's per-round identity is derived deterministically from
//! `(username, room_id)`, so every builder of the anonymity set maps the
//! same user to the same leaf preimage. The identity is bound to a
//! long-lived secret through `commitment`, and each disclosure instance is
//! bound to the commitment through `trapdoor` over a fresh nullifier:
//!
//! ```text
//! commitment = H2(user_id, private_code)     stable while private_code holds
//! trapdoor   = H2(commitment, nullifier)     fresh per round
//! ```
//!
//! Reusing a nullifier across rounds links the disclosures; the protocol
//! layer does not guard against it. Callers refresh the nullifier before
//! every new public disclosure (the session contract does this on
//! `renew_session` and `join_room`).

use crate::hashing::{bytes_to_field, field_to_bytes, poseidon_hash, Hash, HashProfile};
use ark_bn254::Fr;
use rand::{CryptoRng, RngCore};

/// Derive the deterministic per-round identifier for a participant.
///
/// The canonical encoding is `"user=<username>|room=<room_id>"`, reduced to
/// a field element. `user_id` is not secret on its own, but it only ever
/// reaches verifiers hashed into a leaf, never as a public input.
pub fn derive_user_id(username: &str, room_id: u64) -> Fr {
    let info = format!("user={username}|room={room_id}");
    bytes_to_field(info.as_bytes())
}

/// The leaf preimage inserted into the anonymity set for a user.
pub fn leaf_preimage(user_id: &Fr, profile: HashProfile) -> Hash {
    profile.hash_leaf(&field_to_bytes(user_id))
}

/// Bind an identity to its long-lived secret.
pub fn commitment(user_id: &Fr, private_code: &Fr) -> Fr {
    poseidon_hash(&[*user_id, *private_code])
}

/// Bind a disclosure instance to a commitment through a nullifier.
pub fn trapdoor(commitment: &Fr, nullifier: &Fr) -> Fr {
    poseidon_hash(&[*commitment, *nullifier])
}

/// Draw a fresh nullifier from 256 uniformly random bits.
pub fn refresh_nullifier<R: RngCore + CryptoRng>(rng: &mut R) -> Fr {
    let mut buf = [0u8; 32];
    rng.fill_bytes(&mut buf);
    bytes_to_field(&buf)
}

/// Secrets held only by the participant.
///
/// `private_code` is long-lived; `nullifier` is regenerated per round.
#[derive(Debug, Clone)]
pub struct SecretMaterial {
    pub private_code: Fr,
    pub nullifier: Fr,
}

impl SecretMaterial {
    pub fn generate<R: RngCore + CryptoRng>(private_code: Fr, rng: &mut R) -> Self {
        Self {
            private_code,
            nullifier: refresh_nullifier(rng),
        }
    }

    /// Replace the nullifier with a fresh draw. The only permitted mutation.
    pub fn refresh<R: RngCore + CryptoRng>(&mut self, rng: &mut R) {
        self.nullifier = refresh_nullifier(rng);
    }
}

/// The public face of a participant's secrets.
///
/// `commitment` is stable across nullifier refreshes; `trapdoor` changes
/// whenever the nullifier does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicBinding {
    pub commitment: Fr,
    pub trapdoor: Fr,
}

impl PublicBinding {
    pub fn derive(user_id: &Fr, secret: &SecretMaterial) -> Self {
        let commitment = commitment(user_id, &secret.private_code);
        let trapdoor = trapdoor(&commitment, &secret.nullifier);
        Self {
            commitment,
            trapdoor,
        }
    }
}
