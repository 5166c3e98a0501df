//! Core release settings and network selection
//!
//! Every environment lookup happens exactly once, in
//! [`CoreSettings::from_env`]; the resulting struct is passed by reference to
//! the rest of the workflow.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::expand_path;

/// Coin name used for archive layout and the daemon config file name
pub const COIN_NAME: &str = "ghost";

/// Wallet holding participant stake delegations
pub const STAKE_WALLET: &str = "pool_stake";

/// Wallet collecting pool rewards
pub const REWARD_WALLET: &str = "pool_reward";

/// Network the pool node runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    /// Get the network name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        }
    }

    /// Port the daemon publishes block-hash notifications on
    pub fn zmq_port(&self) -> u32 {
        match self {
            Network::Mainnet => 207922,
            Network::Testnet | Network::Regtest => 208922,
        }
    }

    /// Port the pool-management web UI binds to
    pub fn html_port(&self) -> u16 {
        match self {
            Network::Mainnet => 9000,
            Network::Testnet | Network::Regtest => 9001,
        }
    }

    /// Prefix for wallet declarations in the daemon config file
    pub fn wallet_prefix(&self) -> &'static str {
        match self {
            Network::Mainnet => "",
            Network::Testnet => "test.",
            Network::Regtest => "regtest.",
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            other => Err(format!("Unknown network: {}", other)),
        }
    }
}

/// Release and binary settings, built from the environment at startup
#[derive(Debug, Clone)]
pub struct CoreSettings {
    /// Directory the node executables are installed into
    pub bin_dir: PathBuf,
    /// Daemon executable name
    pub daemon_name: String,
    /// RPC CLI executable name
    pub cli_name: String,
    /// Transaction-building tool executable name
    pub tx_name: String,
    /// Core release version, e.g. "0.19.1.10"
    pub version: String,
    /// Optional suffix appended to the release tag
    pub version_tag: String,
    /// Architecture tag including the archive extension
    pub arch: String,
    /// GitHub organisation hosting the core releases
    pub repo: String,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            bin_dir: expand_path("~/ghost-binaries"),
            daemon_name: "ghostd".to_string(),
            cli_name: "ghost-cli".to_string(),
            tx_name: "ghost-tx".to_string(),
            version: "0.19.1.10".to_string(),
            version_tag: String::new(),
            arch: "x86_64-linux-gnu.tgz".to_string(),
            repo: "ghost-coin".to_string(),
        }
    }
}

impl CoreSettings {
    /// Build settings from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bin_dir: env::var("GHOST_BINDIR")
                .map(|v| expand_path(&v))
                .unwrap_or(defaults.bin_dir),
            daemon_name: env::var("GHOSTD").unwrap_or(defaults.daemon_name),
            cli_name: env::var("GHOST_CLI").unwrap_or(defaults.cli_name),
            tx_name: env::var("GHOST_TX").unwrap_or(defaults.tx_name),
            version: env::var("GHOST_VERSION").unwrap_or(defaults.version),
            version_tag: env::var("GHOST_VERSION_TAG").unwrap_or(defaults.version_tag),
            arch: env::var("GHOST_ARCH").unwrap_or(defaults.arch),
            repo: env::var("GHOST_REPO").unwrap_or(defaults.repo),
        }
    }

    /// Release archive file name, e.g. "ghost-0.19.1.10-x86_64-linux-gnu.tgz"
    pub fn release_filename(&self) -> String {
        format!("{}-{}-{}", COIN_NAME, self.version, self.arch)
    }

    /// Download URL for the release archive
    pub fn release_url(&self) -> String {
        format!(
            "https://github.com/{}/{}-core/releases/download/v{}{}/{}",
            self.repo,
            COIN_NAME,
            self.version,
            self.version_tag,
            self.release_filename()
        )
    }

    /// Path of an executable inside the release archive
    pub fn archive_bin_path(&self, executable: &str) -> String {
        format!("{}-{}/bin/{}", COIN_NAME, self.version, executable)
    }

    /// The three executables installed from the archive
    pub fn executables(&self) -> [&str; 3] {
        [&self.daemon_name, &self.cli_name, &self.tx_name]
    }

    /// Path to the local copy of the release archive
    pub fn archive_path(&self) -> PathBuf {
        self.bin_dir.join(self.release_filename())
    }

    /// Path to the installed daemon executable
    pub fn daemon_path(&self) -> PathBuf {
        self.bin_dir.join(&self.daemon_name)
    }

    /// Path to the installed RPC CLI executable
    pub fn cli_path(&self) -> PathBuf {
        self.bin_dir.join(&self.cli_name)
    }

    /// Path of the daemon config file inside a data directory
    pub fn daemon_conf_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("{}.conf", COIN_NAME))
    }
}
