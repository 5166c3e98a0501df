//! SHA256 hashing of release archives
//!
//! The archive checksum is computed and logged so the operator can audit it
//! against the published release hashes; comparison against a pinned value is
//! available as an extension point but not enforced by the workflow.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Result of comparing a computed hash against an expected value
#[derive(Debug, Clone)]
pub struct HashResult {
    /// The computed hash (lowercase hex)
    pub computed: String,
    /// The expected hash (lowercase hex)
    pub expected: String,
    /// Whether they match
    pub matches: bool,
}

/// Compute the SHA256 hash of a file
pub fn compute_file_hash(path: &Path) -> Result<String, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute and log the release archive hash
pub fn log_release_hash(archive: &Path) -> Result<String, String> {
    let hash = compute_file_hash(archive)?;
    log::info!("Release hash: {}", hash);
    println!("Release hash: {}", hash);
    Ok(hash)
}

/// Verify a file's SHA256 hash against an expected value
pub fn verify_file_hash(path: &Path, expected_hash: &str) -> Result<HashResult, String> {
    let computed = compute_file_hash(path)?;
    let expected = expected_hash.to_lowercase();
    let matches = computed == expected;

    log::info!(
        "Hash verification for {}: computed={}, matches={}",
        path.display(),
        computed,
        matches
    );

    Ok(HashResult {
        computed,
        expected,
        matches,
    })
}
