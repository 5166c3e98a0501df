//! Pool settings file
//!
//! Builds and writes the `stakepool.json` the pool service reads at startup.
//! Field names follow the established settings schema, so a file produced
//! here is interchangeable with one published by an existing pool.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::provision::ProvisionedWallets;
use crate::settings::Network;

pub const POOL_SETTINGS_FILE: &str = "stakepool.json";
pub const DEFAULT_START_HEIGHT: u64 = 200_000;

/// Fee schedule entry, active from `height` onward
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeParameters {
    pub height: u64,
    #[serde(rename = "poolfeepercent")]
    pub pool_fee_percent: u64,
    #[serde(rename = "stakebonuspercent")]
    pub stake_bonus_percent: u64,
    #[serde(rename = "payoutthreshold")]
    pub payout_threshold: f64,
    #[serde(rename = "minblocksbetweenpayments")]
    pub min_blocks_between_payments: u64,
    #[serde(rename = "minoutputvalue")]
    pub min_output_value: f64,
}

impl Default for FeeParameters {
    fn default() -> Self {
        Self {
            height: 0,
            pool_fee_percent: 3,
            stake_bonus_percent: 5,
            payout_threshold: 0.5,
            min_blocks_between_payments: 100,
            min_output_value: 0.1,
        }
    }
}

/// Settings for a pool node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSettings {
    pub mode: String,
    pub debug: bool,
    #[serde(rename = "ghostbindir")]
    pub bin_dir: String,
    #[serde(rename = "ghostdatadir")]
    pub data_dir: String,
    #[serde(rename = "startheight")]
    pub start_height: u64,
    #[serde(rename = "pooladdress")]
    pub pool_address: String,
    #[serde(rename = "rewardaddress")]
    pub reward_address: String,
    #[serde(rename = "zmqhost")]
    pub zmq_host: String,
    #[serde(rename = "zmqport")]
    pub zmq_port: u32,
    #[serde(rename = "htmlhost")]
    pub html_host: String,
    #[serde(rename = "htmlport")]
    pub html_port: u16,
    pub parameters: Vec<FeeParameters>,
}

impl PoolSettings {
    /// Settings for a freshly provisioned master pool
    pub fn master(
        bin_dir: &Path,
        data_dir: &Path,
        network: Network,
        wallets: &ProvisionedWallets,
    ) -> Self {
        Self {
            mode: "master".to_string(),
            debug: true,
            bin_dir: bin_dir.display().to_string(),
            data_dir: data_dir.display().to_string(),
            start_height: DEFAULT_START_HEIGHT,
            pool_address: wallets.stake_address.clone(),
            reward_address: wallets.reward_address.clone(),
            zmq_host: "tcp://127.0.0.1".to_string(),
            zmq_port: network.zmq_port(),
            html_host: "localhost".to_string(),
            html_port: network.html_port(),
            parameters: vec![FeeParameters::default()],
        }
    }
}

/// Write the pool settings file, failing if one already exists
pub fn write_pool_settings(pool_dir: &Path, settings: &PoolSettings) -> Result<PathBuf, String> {
    let value = serde_json::to_value(settings)
        .map_err(|e| format!("Failed to serialize pool settings: {}", e))?;
    write_pool_settings_value(pool_dir, &value)
}

/// Write an already-assembled pool settings document
pub fn write_pool_settings_value(pool_dir: &Path, value: &Value) -> Result<PathBuf, String> {
    let path = pool_dir.join(POOL_SETTINGS_FILE);

    if path.exists() {
        return Err(format!("Error: {} exists, exiting.", path.display()));
    }

    let contents = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize pool settings: {}", e))?;

    fs::write(&path, contents + "\n")
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;

    log::info!("Pool settings written to {}", path.display());
    Ok(path)
}

/// Print the provisioning summary the operator must record
///
/// Goes to stdout rather than the log so the mnemonics never end up in a
/// log file.
pub fn print_summary(wallets: &ProvisionedWallets) {
    println!("Stake wallet mnemonic: {}", wallets.stake_mnemonic);
    println!("Reward wallet mnemonic: {}", wallets.reward_mnemonic);
    println!("Stake address: {}", wallets.stake_address);
    println!("Reward address: {}", wallets.reward_address);
}
