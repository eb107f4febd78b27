use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use zk_bidding::bridge::validate_and_strip_hex;
use zk_bidding::{
    bytes_to_field, derive_user_id, field_to_bytes, BidProofBundle, BiddingSession, ByteLeaf,
    HashProfile, KeyStore, LeafSet, MerkleTree, PredicateShape, MERKLE_DEPTH,
};

const MAX_REGISTRY_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Generate an anonymous bid proof for one registered participant.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File listing registered usernames, one per line.
    #[arg(short, long)]
    registry_file: PathBuf,

    /// The participant's username; must appear in the registry.
    #[arg(short, long)]
    username: String,

    /// Room the bid is placed in.
    #[arg(long)]
    room_id: u64,

    /// The participant's long-lived private code, hex encoded.
    #[arg(short, long)]
    private_code: String,

    /// Bid value; must be non-zero.
    #[arg(short, long)]
    bid: u64,

    /// Key file produced by the setup binary.
    #[arg(short, long, default_value = "keys.json")]
    keys: PathBuf,

    #[arg(short, long, default_value = "proof.json")]
    output: PathBuf,
}

fn read_registry(path: &PathBuf) -> Result<Vec<String>> {
    let metadata = fs::metadata(path).context("Failed to read registry file metadata")?;
    if metadata.len() > MAX_REGISTRY_FILE_SIZE {
        return Err(anyhow::anyhow!(
            "Registry file too large: {} bytes (max {} bytes)",
            metadata.len(),
            MAX_REGISTRY_FILE_SIZE
        ));
    }

    let content = fs::read_to_string(path).context("Failed to read registry file")?;
    let usernames: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .collect();

    if usernames.is_empty() {
        return Err(anyhow::anyhow!(
            "No usernames found in registry file '{}'",
            path.display()
        ));
    }
    Ok(usernames)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Loading registry from: {}", args.registry_file.display());
    let usernames = read_registry(&args.registry_file)?;
    println!("Loaded {} registered usernames", usernames.len());

    if !usernames.iter().any(|u| u == &args.username) {
        return Err(anyhow::anyhow!(
            "Username '{}' is not in registry file '{}'",
            args.username,
            args.registry_file.display()
        ));
    }

    let private_code_hex =
        validate_and_strip_hex(&args.private_code).context("Invalid private code")?;
    let private_code_bytes =
        hex::decode(&private_code_hex).context("Failed to decode private code hex")?;
    let private_code = bytes_to_field(&private_code_bytes);

    println!("Building anonymity set for room {}...", args.room_id);
    let leaves: Vec<ByteLeaf> = usernames
        .iter()
        .map(|name| {
            let user_id = derive_user_id(name, args.room_id);
            ByteLeaf::new(field_to_bytes(&user_id).to_vec())
        })
        .collect();
    let tree = MerkleTree::build(
        &LeafSet::new(leaves),
        HashProfile::CircuitFriendly,
        MERKLE_DEPTH,
    )
    .context("Failed to build the membership tree")?;
    println!("Merkle root: {}", hex::encode(tree.root()));

    println!("Loading key material from: {}", args.keys.display());
    let store_json = fs::read_to_string(&args.keys)
        .with_context(|| format!("Failed to read key file: {}", args.keys.display()))?;
    let store = KeyStore::from_json(&store_json).context("Failed to parse key file")?;
    let prover = store
        .load_prover(PredicateShape::MembershipBid)
        .context("Failed to load membership keys")?;

    let mut rng = rand::thread_rng();
    let mut session = BiddingSession::new(Arc::new(tree), Arc::new(prover))
        .context("Failed to create session")?;
    session
        .init_session(args.room_id, &args.username, private_code, &mut rng)
        .context("Failed to initialize session")?;

    println!("Generating proof for bid {} (this may take a while)...", args.bid);
    let artifact = session
        .get_proof(args.bid, &mut rng)
        .context("Failed to generate proof")?;
    let bundle = BidProofBundle::from_artifact(PredicateShape::MembershipBid, artifact)
        .context("Failed to assemble proof bundle")?;

    let json = serde_json::to_string_pretty(&bundle).context("Failed to serialize proof")?;
    fs::write(&args.output, json)
        .with_context(|| format!("Failed to write proof file: {}", args.output.display()))?;

    println!("Proof written to {}", args.output.display());
    println!("Nullifier: {}", bundle.nullifier);
    Ok(())
}
