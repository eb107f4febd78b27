use rand::RngCore;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;

fn generate_random_usernames(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    let mut usernames = Vec::with_capacity(count);
    for _ in 0..count {
        let mut tag = [0u8; 8];
        rng.fill_bytes(&mut tag);
        usernames.push(format!("user_{}", hex::encode(tag)));
    }
    usernames
}

fn check_duplicates(usernames: &[String]) -> bool {
    let unique: HashSet<_> = usernames.iter().collect();
    unique.len() == usernames.len()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let count = 1000;
    let output_file = "registry.txt";

    println!("Generating {count} random usernames...");
    let usernames = generate_random_usernames(count);

    if !check_duplicates(&usernames) {
        return Err("Generated duplicate usernames".into());
    }

    println!("Writing usernames to {output_file}...");
    let mut file = File::create(output_file)?;
    for username in &usernames {
        writeln!(file, "{username}")?;
    }

    println!("Successfully generated {count} usernames");
    println!("First 5 usernames:");
    for (i, username) in usernames.iter().take(5).enumerate() {
        println!("  {}: {}", i + 1, username);
    }

    Ok(())
}
