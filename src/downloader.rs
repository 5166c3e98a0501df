//! Release archive and observer config download
//!
//! Downloads the core release archive when it is not already cached in the
//! binaries directory, and fetches remote pool configs for observer mode.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use futures_util::StreamExt;
use reqwest::Client;

use crate::hasher;
use crate::settings::CoreSettings;

/// Create an HTTP client with appropriate headers
fn create_client() -> Result<Client, String> {
    Client::builder()
        .user_agent(concat!("coldstakepool-prepare/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {}", e))
}

/// Download the core release archive if not already cached, then log its hash
pub async fn download_core(settings: &CoreSettings) -> Result<PathBuf, String> {
    log::info!("Download and verify the core release.");

    fs::create_dir_all(&settings.bin_dir)
        .map_err(|e| format!("Failed to create binaries directory: {}", e))?;

    let packed_path = settings.archive_path();
    if packed_path.exists() {
        log::info!("Archive already present at {}", packed_path.display());
    } else {
        download_file(&settings.release_url(), &packed_path).await?;
    }

    hasher::log_release_hash(&packed_path)?;

    Ok(packed_path)
}

/// Download a file with throttled progress logging
pub async fn download_file(url: &str, dest: &Path) -> Result<(), String> {
    let client = create_client()?;

    log::info!("Downloading {} to {}", url, dest.display());

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create directory: {}", e))?;
    }

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("Failed to start download: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("Download failed with status {}", response.status()));
    }

    let total_size = response.content_length().unwrap_or(0);

    let mut file = File::create(dest).map_err(|e| format!("Failed to create file: {}", e))?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let mut last_log = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| format!("Download error: {}", e))?;

        file.write_all(&chunk)
            .map_err(|e| format!("Failed to write file: {}", e))?;

        downloaded += chunk.len() as u64;

        if last_log.elapsed().as_secs() >= 3 {
            if total_size > 0 {
                log::info!(
                    "Downloaded {:.1} of {:.1} MiB",
                    downloaded as f64 / (1024.0 * 1024.0),
                    total_size as f64 / (1024.0 * 1024.0)
                );
            } else {
                log::info!(
                    "Downloaded {:.1} MiB",
                    downloaded as f64 / (1024.0 * 1024.0)
                );
            }
            last_log = Instant::now();
        }
    }

    log::info!("Download complete: {} bytes", downloaded);

    Ok(())
}

/// Fetch a JSON document, used to pull a pool config in observer mode
pub async fn fetch_json(url: &str) -> Result<serde_json::Value, String> {
    let client = create_client()?;

    log::info!("Fetching pool config from {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("Failed to fetch {}: {}", url, e))?;

    if !response.status().is_success() {
        return Err(format!(
            "Config fetch failed with status {}",
            response.status()
        ));
    }

    response
        .json()
        .await
        .map_err(|e| format!("Failed to parse config from {}: {}", url, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cached_archive_path() {
        let dir = tempdir().unwrap();
        let settings = CoreSettings {
            bin_dir: dir.path().to_path_buf(),
            ..CoreSettings::default()
        };
        assert_eq!(
            settings.archive_path(),
            dir.path().join("ghost-0.19.1.10-x86_64-linux-gnu.tgz")
        );
    }

    #[tokio::test]
    async fn test_cached_archive_skips_download() {
        let dir = tempdir().unwrap();
        let settings = CoreSettings {
            bin_dir: dir.path().to_path_buf(),
            ..CoreSettings::default()
        };
        fs::write(settings.archive_path(), b"cached archive bytes").unwrap();

        // The release URL is unreachable; a cache hit must not touch it
        let packed = download_core(&settings).await.unwrap();
        assert_eq!(fs::read(packed).unwrap(), b"cached archive bytes");
    }
}
