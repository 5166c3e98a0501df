//! Daemon config file generation
//!
//! Writes the `ghost.conf` the pool node runs with: two named wallets, the
//! message-bus block-hash publisher, and the index flags the pool service
//! relies on. An existing config file is a fatal conflict, never overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use crate::settings::{CoreSettings, Network, REWARD_WALLET, STAKE_WALLET};

/// Generate the daemon config contents for a network
pub fn generate_daemon_conf(network: Network) -> String {
    let mut lines = Vec::new();

    if network != Network::Mainnet {
        lines.push(format!("{}=1", network.as_str()));
        lines.push(String::new());
    }

    lines.push(format!(
        "zmqpubhashblock=tcp://127.0.0.1:{}",
        network.zmq_port()
    ));

    let prefix = network.wallet_prefix();
    lines.push(format!("{}wallet={}", prefix, STAKE_WALLET));
    lines.push(format!("{}wallet={}", prefix, REWARD_WALLET));

    lines.push("csindex=1".to_string());
    lines.push("addressindex=1".to_string());

    lines.join("\n") + "\n"
}

/// Write the daemon config file, failing if one already exists
pub fn write_daemon_conf(
    settings: &CoreSettings,
    data_dir: &Path,
    network: Network,
) -> Result<PathBuf, String> {
    let conf_path = settings.daemon_conf_path(data_dir);

    if conf_path.exists() {
        return Err(format!("Error: {} exists, exiting.", conf_path.display()));
    }

    fs::write(&conf_path, generate_daemon_conf(network))
        .map_err(|e| format!("Failed to write {}: {}", conf_path.display(), e))?;

    log::info!("Daemon config written to {}", conf_path.display());
    Ok(conf_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_testnet_conf_contents() {
        let conf = generate_daemon_conf(Network::Testnet);
        assert!(conf.starts_with("testnet=1\n"));
        assert!(conf.contains("zmqpubhashblock=tcp://127.0.0.1:208922"));
        assert!(conf.contains("test.wallet=pool_stake"));
        assert!(conf.contains("test.wallet=pool_reward"));
        assert!(conf.contains("csindex=1"));
        assert!(conf.contains("addressindex=1"));
    }

    #[test]
    fn test_mainnet_conf_has_no_network_line() {
        let conf = generate_daemon_conf(Network::Mainnet);
        assert!(!conf.contains("mainnet=1"));
        assert!(conf.contains("zmqpubhashblock=tcp://127.0.0.1:207922"));
        assert!(conf.contains("wallet=pool_stake"));
        assert!(!conf.contains("test.wallet"));
    }

    #[test]
    fn test_regtest_conf_contents() {
        let conf = generate_daemon_conf(Network::Regtest);
        assert!(conf.starts_with("regtest=1\n"));
        assert!(conf.contains("regtest.wallet=pool_stake"));
        assert!(conf.contains("zmqpubhashblock=tcp://127.0.0.1:208922"));
    }

    #[test]
    fn test_write_conf_creates_file() {
        let dir = tempdir().unwrap();
        let settings = CoreSettings::default();

        let path = write_daemon_conf(&settings, dir.path(), Network::Testnet).unwrap();
        assert_eq!(path, dir.path().join("ghost.conf"));

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("testnet=1"));
    }

    #[test]
    fn test_existing_conf_is_never_overwritten() {
        let dir = tempdir().unwrap();
        let settings = CoreSettings::default();
        let conf_path = dir.path().join("ghost.conf");
        fs::write(&conf_path, "keep me\n").unwrap();

        let result = write_daemon_conf(&settings, dir.path(), Network::Testnet);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("exists"));
        assert_eq!(fs::read_to_string(&conf_path).unwrap(), "keep me\n");
    }
}
