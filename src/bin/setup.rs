use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use zk_bidding::{BidProver, KeyStore, PredicateShape};

/// One-time trusted setup: compile both predicate shapes and persist the
/// name-keyed key material. Run once per deployment; provers and verifiers
/// load the resulting file at startup.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Where to write the key file.
    #[arg(short, long, default_value = "keys.json")]
    output: PathBuf,

    /// Overwrite an existing key file. Regenerating keys invalidates every
    /// proof produced under the previous ones.
    #[arg(long)]
    force: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.output.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Key file already exists: {}. Pass --force to regenerate (this invalidates all existing proofs).",
            args.output.display()
        ));
    }

    let mut rng = rand::thread_rng();
    let mut store = KeyStore::new();

    for shape in [PredicateShape::MembershipBid, PredicateShape::OpenBid] {
        println!("Compiling predicate shape {} (this may take a while)...", shape.name());
        let prover = BidProver::setup(shape, &mut rng)
            .with_context(|| format!("Setup failed for shape {}", shape.name()))?;
        store
            .insert(shape, prover.key_material())
            .with_context(|| format!("Failed to encode keys for shape {}", shape.name()))?;
        println!("  {} ready", shape.name());
    }

    let json = store.to_json().context("Failed to serialize key store")?;
    fs::write(&args.output, json)
        .with_context(|| format!("Failed to write key file: {}", args.output.display()))?;

    println!("Key material written to {}", args.output.display());
    Ok(())
}
