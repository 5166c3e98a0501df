//! Cold staking pool preparation
//!
//! Bootstraps a pool operator node: downloads the node release, installs the
//! binaries, writes the daemon and pool config files, and provisions the two
//! pool wallets in master or observer mode.

use std::path::PathBuf;

pub mod args;
pub mod conf;
pub mod daemon;
pub mod downloader;
pub mod extractor;
pub mod hasher;
pub mod logging;
pub mod pool;
pub mod provision;
pub mod rpc;
pub mod settings;

pub use settings::{CoreSettings, Network};

/// Expand a leading `~` to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_path("~"), home);
        assert_eq!(expand_path("~/.ghost"), home.join(".ghost"));
    }

    #[test]
    fn test_expand_path_absolute_unchanged() {
        assert_eq!(expand_path("/var/lib/ghost"), PathBuf::from("/var/lib/ghost"));
    }
}
