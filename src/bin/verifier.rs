use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::fs;
use std::io::{BufRead, BufReader, Seek, Write};
use std::path::{Path, PathBuf};
use zk_bidding::{BidProofBundle, KeyStore};

const DEFAULT_MAX_PROOF_FILE_SIZE: u64 = 1024 * 1024;

fn max_proof_file_size() -> u64 {
    std::env::var("ZKBID_MAX_PROOF_FILE_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_PROOF_FILE_SIZE)
}

/// Verify an anonymous bid proof and record its nullifier.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Proof bundle JSON produced by the prover.
    #[arg(short, long)]
    proof_file: PathBuf,

    /// Key file produced by the setup binary.
    #[arg(short, long, default_value = "keys.json")]
    keys: PathBuf,
}

/// Append the nullifier to the per-proof-file ledger, rejecting doubles.
/// A repeated nullifier means a bid was already accepted for that round.
fn check_and_add_nullifier(nullifier_file: &Path, nullifier: &str) -> Result<()> {
    let normalized = nullifier.trim().to_lowercase();

    let file = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(nullifier_file)
        .context("Failed to open nullifier ledger")?;

    let reader = BufReader::new(&file);
    for line in reader.lines() {
        let line = line.context("Failed to read nullifier ledger")?;
        if line.trim().to_lowercase() == normalized {
            return Err(anyhow::anyhow!("Nullifier already recorded; duplicate bid"));
        }
    }

    let mut writer = std::io::BufWriter::new(&file);
    writer
        .seek(std::io::SeekFrom::End(0))
        .context("Failed to seek to end of ledger")?;
    writer
        .write_all(normalized.as_bytes())
        .context("Failed to write nullifier")?;
    writer.write_all(b"\n").context("Failed to write newline")?;
    writer.flush().context("Failed to flush ledger")?;

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Loading proof from: {}", args.proof_file.display());
    let metadata = fs::metadata(&args.proof_file).context("Failed to read proof file metadata")?;
    debug!("Proof file size: {} bytes", metadata.len());
    if metadata.len() > max_proof_file_size() {
        return Err(anyhow::anyhow!(
            "Proof file too large: {} bytes (max {} bytes). Set ZKBID_MAX_PROOF_FILE_SIZE to override.",
            metadata.len(),
            max_proof_file_size()
        ));
    }

    let proof_content = fs::read_to_string(&args.proof_file).context("Failed to read proof file")?;
    let bundle: BidProofBundle =
        serde_json::from_str(&proof_content).context("Failed to parse proof JSON")?;

    bundle
        .validate()
        .context("Proof bundle validation failed; the bundle is structurally inconsistent")?;
    info!("Bundle validation passed");

    println!("Proof details:");
    println!("  Shape: {}", bundle.shape);
    if let Some(root) = &bundle.merkle_root {
        println!("  Merkle Root: {root}");
    }
    println!("  Nullifier: {}", bundle.nullifier);
    println!("  Timestamp: {}", bundle.timestamp);

    println!("Loading key material from: {}", args.keys.display());
    let store_json = fs::read_to_string(&args.keys)
        .with_context(|| format!("Failed to read key file: {}", args.keys.display()))?;
    let store = KeyStore::from_json(&store_json).context("Failed to parse key file")?;
    let prover = store
        .load_prover(bundle.shape().context("Unknown predicate shape")?)
        .context("Failed to load keys for the bundle's shape")?;

    println!("Verifying proof...");
    let valid = prover
        .verify(&bundle.proof)
        .context("Proof verification errored on malformed input")?;

    if !valid {
        println!("\n✗ Proof verification FAILED!");
        return Err(anyhow::anyhow!("Proof verification failed"));
    }

    println!("\n✓ Proof verification PASSED!");
    println!("The prover belongs to the published anonymity set and placed a");
    println!("valid non-zero bid without revealing which participant they are.");

    let mut nullifier_path = args.proof_file.clone();
    nullifier_path.set_extension("nullifiers.txt");
    check_and_add_nullifier(&nullifier_path, &bundle.nullifier).with_context(|| {
        format!("Failed to record nullifier to {}", nullifier_path.display())
    })?;
    println!("Nullifier recorded to: {}", nullifier_path.display());

    Ok(())
}
