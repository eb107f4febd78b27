use ark_bn254::{Bn254, Fr};
use ark_groth16::{prepare_verifying_key, Groth16};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use zk_bidding::{
    bytes_to_field, derive_user_id, field_to_bytes, leaf_preimage, BidAssignment, BidProver,
    BiddingSession, ByteLeaf, HashProfile, LeafSet, MembershipBidCircuit, MerkleTree,
    OpenBidCircuit, PredicateShape, PublicBinding, SecretMaterial,
};

/// Build a fully assigned membership circuit for one user of a small room.
fn membership_assignment(
    depth: usize,
    usernames: &[&str],
    who: &str,
    room_id: u64,
    private_code: Fr,
    bid: u64,
    rng: &mut StdRng,
) -> (MembershipBidCircuit, MerkleTree) {
    let leaves: Vec<ByteLeaf> = usernames
        .iter()
        .map(|name| ByteLeaf::new(field_to_bytes(&derive_user_id(name, room_id)).to_vec()))
        .collect();
    let tree = MerkleTree::build(&LeafSet::new(leaves), HashProfile::CircuitFriendly, depth)
        .expect("tree should build");

    let user_id = derive_user_id(who, room_id);
    let secret = SecretMaterial::generate(private_code, rng);
    let binding = PublicBinding::derive(&user_id, &secret);

    let leaf = leaf_preimage(&user_id, tree.profile());
    let witness = tree.prove_membership(&leaf).expect("user should be in set");

    let circuit = MembershipBidCircuit {
        merkle_root: Some(bytes_to_field(tree.root())),
        nullifier: Some(secret.nullifier),
        commitment: Some(binding.commitment),
        trapdoor: Some(binding.trapdoor),
        bid_value: Some(Fr::from(bid)),
        user_id: Some(user_id),
        private_code: Some(secret.private_code),
        siblings: witness
            .siblings()
            .iter()
            .map(|s| Some(bytes_to_field(s)))
            .collect(),
        position_bits: witness.position_bits.iter().copied().map(Some).collect(),
    };
    (circuit, tree)
}

fn open_assignment(private_code: Fr, bid: u64, rng: &mut StdRng) -> OpenBidCircuit {
    let user_id = derive_user_id("carol", 7);
    let secret = SecretMaterial::generate(private_code, rng);
    let binding = PublicBinding::derive(&user_id, &secret);
    OpenBidCircuit {
        nullifier: Some(secret.nullifier),
        commitment: Some(binding.commitment),
        trapdoor: Some(binding.trapdoor),
        bid_value: Some(Fr::from(bid)),
        user_id: Some(user_id),
        private_code: Some(secret.private_code),
    }
}

const USERS: [&str; 4] = ["alice", "bob", "carol", "dave"];

#[test]
fn test_membership_circuit_accepts_valid_assignment() {
    let mut rng = StdRng::seed_from_u64(1);
    let (circuit, _) =
        membership_assignment(2, &USERS, "bob", 1111, Fr::from(42u64), 100, &mut rng);

    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit.generate_constraints(cs.clone()).unwrap();
    assert!(cs.is_satisfied().unwrap());
}

#[test]
fn test_membership_circuit_rejects_wrong_root() {
    let mut rng = StdRng::seed_from_u64(2);
    let (mut circuit, _) =
        membership_assignment(2, &USERS, "bob", 1111, Fr::from(42u64), 100, &mut rng);
    circuit.merkle_root = circuit.merkle_root.map(|r| r + Fr::from(1u64));

    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit.generate_constraints(cs.clone()).unwrap();
    assert!(!cs.is_satisfied().unwrap());
}

#[test]
fn test_membership_circuit_rejects_wrong_private_code() {
    let mut rng = StdRng::seed_from_u64(3);
    let (mut circuit, _) =
        membership_assignment(2, &USERS, "bob", 1111, Fr::from(42u64), 100, &mut rng);
    circuit.private_code = Some(Fr::from(43u64));

    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit.generate_constraints(cs.clone()).unwrap();
    assert!(!cs.is_satisfied().unwrap());
}

#[test]
fn test_membership_circuit_rejects_flipped_position_bit() {
    let mut rng = StdRng::seed_from_u64(4);
    let (mut circuit, _) =
        membership_assignment(2, &USERS, "carol", 1111, Fr::from(42u64), 100, &mut rng);
    circuit.position_bits[0] = circuit.position_bits[0].map(|b| !b);

    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit.generate_constraints(cs.clone()).unwrap();
    assert!(!cs.is_satisfied().unwrap());
}

#[test]
fn test_membership_circuit_rejects_outsider_identity() {
    let mut rng = StdRng::seed_from_u64(5);
    let (mut circuit, _) =
        membership_assignment(2, &USERS, "dave", 1111, Fr::from(42u64), 100, &mut rng);

    // An identity outside the set: binding constraints still hold for it,
    // but the leaf no longer matches the committed path.
    let outsider = derive_user_id("mallory", 1111);
    let secret = SecretMaterial::generate(Fr::from(42u64), &mut rng);
    let binding = PublicBinding::derive(&outsider, &secret);
    circuit.user_id = Some(outsider);
    circuit.nullifier = Some(secret.nullifier);
    circuit.commitment = Some(binding.commitment);
    circuit.trapdoor = Some(binding.trapdoor);

    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit.generate_constraints(cs.clone()).unwrap();
    assert!(!cs.is_satisfied().unwrap());
}

#[test]
fn test_zero_bid_fails_synthesis() {
    let mut rng = StdRng::seed_from_u64(6);
    let (circuit, _) = membership_assignment(2, &USERS, "bob", 1111, Fr::from(42u64), 0, &mut rng);

    // No inverse witness exists for a zero bid.
    let cs = ConstraintSystem::<Fr>::new_ref();
    assert!(circuit.generate_constraints(cs).is_err());
}

#[test]
fn test_membership_groth16_round_trip() {
    let mut rng = StdRng::seed_from_u64(7);
    let depth = 4;
    let (circuit, _) =
        membership_assignment(depth, &USERS, "alice", 2222, Fr::from(9u64), 500, &mut rng);
    let public_inputs = circuit.public_inputs().unwrap();

    let pk = Groth16::<Bn254>::generate_random_parameters_with_reduction(
        MembershipBidCircuit::blank(depth),
        &mut rng,
    )
    .unwrap();
    let proof =
        Groth16::<Bn254>::create_random_proof_with_reduction(circuit, &pk, &mut rng).unwrap();
    let pvk = prepare_verifying_key(&pk.vk);

    assert!(Groth16::<Bn254>::verify_proof(&pvk, &proof, &public_inputs).unwrap());

    // Flipping a single bit of the root makes the statement false.
    let mut tampered = public_inputs.clone();
    tampered[0] += Fr::from(1u64);
    assert!(!Groth16::<Bn254>::verify_proof(&pvk, &proof, &tampered).unwrap());

    // Public input order is the calling convention; reordering is a
    // different statement, not an error.
    let mut reordered = public_inputs;
    reordered.swap(1, 2);
    assert!(!Groth16::<Bn254>::verify_proof(&pvk, &proof, &reordered).unwrap());
}

#[test]
fn test_open_bid_prover_round_trip() {
    let mut rng = StdRng::seed_from_u64(8);
    let prover = BidProver::setup(PredicateShape::OpenBid, &mut rng).unwrap();

    let circuit = open_assignment(Fr::from(5u64), 250, &mut rng);
    let artifact = prover
        .prove(BidAssignment::Open(circuit), &mut rng)
        .unwrap();

    assert_eq!(artifact.public_inputs.len(), 4);
    assert!(prover.verify(&artifact).unwrap());
}

#[test]
fn test_open_bid_rejects_tampered_public_input() {
    let mut rng = StdRng::seed_from_u64(9);
    let prover = BidProver::setup(PredicateShape::OpenBid, &mut rng).unwrap();

    let circuit = open_assignment(Fr::from(5u64), 250, &mut rng);
    let artifact = prover.prove(BidAssignment::Open(circuit), &mut rng).unwrap();

    let mut inputs = artifact.public_field_inputs().unwrap();
    inputs[3] += Fr::from(1u64);
    assert!(!prover.verify_with_inputs(&artifact, &inputs).unwrap());
}

#[test]
fn test_prover_rejects_wrong_shape_assignment() {
    let mut rng = StdRng::seed_from_u64(10);
    let prover = BidProver::setup(PredicateShape::OpenBid, &mut rng).unwrap();

    let (circuit, _) =
        membership_assignment(2, &USERS, "bob", 1111, Fr::from(42u64), 100, &mut rng);
    let result = prover.prove(BidAssignment::Membership(circuit), &mut rng);
    assert!(matches!(result, Err(zk_bidding::Error::Prove(_))));
}

#[test]
fn test_verify_rejects_wrong_input_arity() {
    let mut rng = StdRng::seed_from_u64(11);
    let prover = BidProver::setup(PredicateShape::OpenBid, &mut rng).unwrap();

    let circuit = open_assignment(Fr::from(5u64), 250, &mut rng);
    let artifact = prover.prove(BidAssignment::Open(circuit), &mut rng).unwrap();

    let mut inputs = artifact.public_field_inputs().unwrap();
    inputs.push(Fr::from(1u64));
    assert!(matches!(
        prover.verify_with_inputs(&artifact, &inputs),
        Err(zk_bidding::Error::MalformedInputs(_))
    ));
}

#[test]
fn test_verify_rejects_malformed_proof_points() {
    let mut rng = StdRng::seed_from_u64(12);
    let prover = BidProver::setup(PredicateShape::OpenBid, &mut rng).unwrap();

    let circuit = open_assignment(Fr::from(5u64), 250, &mut rng);
    let artifact = prover.prove(BidAssignment::Open(circuit), &mut rng).unwrap();

    // Not hex at all.
    let mut garbled = artifact.clone();
    garbled.a[0] = "zz".repeat(32);
    assert!(matches!(
        prover.verify(&garbled),
        Err(zk_bidding::Error::MalformedProof(_))
    ));

    // Well-typed hex that is overwhelmingly unlikely to land on the curve.
    let mut off_curve = artifact.clone();
    off_curve.a[0] = "11".repeat(32);
    assert!(matches!(
        prover.verify(&off_curve),
        Err(zk_bidding::Error::MalformedProof(_))
    ));

    // Wrong width.
    let mut short = artifact;
    short.c[1] = "ab".repeat(16);
    assert!(matches!(
        prover.verify(&short),
        Err(zk_bidding::Error::MalformedProof(_))
    ));
}

#[test]
fn test_session_rejects_general_purpose_tree() {
    let mut rng = StdRng::seed_from_u64(13);
    let prover = Arc::new(BidProver::setup(PredicateShape::OpenBid, &mut rng).unwrap());

    let leaves: Vec<ByteLeaf> = USERS.iter().map(|u| ByteLeaf::from(*u)).collect();
    let tree = Arc::new(
        MerkleTree::build(
            &LeafSet::new(leaves),
            HashProfile::GeneralPurpose,
            zk_bidding::MERKLE_DEPTH,
        )
        .unwrap(),
    );

    // Rejected for the profile before the prover shape is even considered.
    assert!(matches!(
        BiddingSession::new(tree, prover),
        Err(zk_bidding::Error::Construction(_))
    ));
}
