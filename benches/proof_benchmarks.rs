use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use zk_bidding::{
    derive_user_id, field_to_bytes, leaf_preimage, BidProver, BiddingSession, ByteLeaf,
    HashProfile, LeafSet, MerkleTree, PredicateShape, MERKLE_DEPTH,
};

fn room_leaves(count: usize, room_id: u64) -> Vec<ByteLeaf> {
    (0..count)
        .map(|i| {
            let user_id = derive_user_id(&format!("username_{}", i + 1), room_id);
            ByteLeaf::new(field_to_bytes(&user_id).to_vec())
        })
        .collect()
}

fn bench_tree_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_build");

    for leaf_count in [64, 256, 1024].iter() {
        let leaves = room_leaves(*leaf_count, 1111);
        group.bench_with_input(
            BenchmarkId::from_parameter(leaf_count),
            leaf_count,
            |b, _| {
                b.iter(|| {
                    black_box(
                        MerkleTree::build(
                            &LeafSet::new(leaves.clone()),
                            HashProfile::CircuitFriendly,
                            MERKLE_DEPTH,
                        )
                        .unwrap(),
                    )
                })
            },
        );
    }

    group.finish();
}

fn bench_witness_extraction(c: &mut Criterion) {
    let tree = MerkleTree::build(
        &LeafSet::new(room_leaves(1024, 1111)),
        HashProfile::CircuitFriendly,
        MERKLE_DEPTH,
    )
    .unwrap();
    let user_id = derive_user_id("username_512", 1111);
    let leaf = leaf_preimage(&user_id, tree.profile());

    c.bench_function("witness_extraction_1024", |b| {
        b.iter(|| black_box(tree.prove_membership(&leaf).unwrap()))
    });
}

fn bench_membership_proof(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let room_id = 1111;
    let tree = Arc::new(
        MerkleTree::build(
            &LeafSet::new(room_leaves(1024, room_id)),
            HashProfile::CircuitFriendly,
            MERKLE_DEPTH,
        )
        .unwrap(),
    );
    let prover = Arc::new(BidProver::setup(PredicateShape::MembershipBid, &mut rng).unwrap());
    let mut session = BiddingSession::new(tree, prover.clone()).unwrap();
    session
        .init_session(room_id, "username_1", ark_bn254::Fr::from(42u64), &mut rng)
        .unwrap();

    c.bench_function("membership_prove", |b| {
        b.iter(|| black_box(session.get_proof(100, &mut rng).unwrap()))
    });

    let artifact = session.get_proof(100, &mut rng).unwrap();
    c.bench_function("membership_verify", |b| {
        b.iter(|| black_box(prover.verify(&artifact).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_tree_build,
    bench_witness_extraction,
    bench_membership_proof
);
criterion_main!(benches);
