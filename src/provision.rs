//! Wallet provisioning
//!
//! Master mode seeds the two pool wallets from fresh or supplied mnemonics and
//! derives the pool's cold-staking and reward addresses. Observer mode pulls a
//! running pool's published config and imports its addresses watch-only.

use std::path::Path;

use serde_json::{json, Value};

use crate::args::RunConfig;
use crate::pool;
use crate::rpc::RpcClient;
use crate::settings::{CoreSettings, REWARD_WALLET, STAKE_WALLET};

/// Wallet material produced by master-mode provisioning
pub struct ProvisionedWallets {
    pub stake_mnemonic: String,
    pub reward_mnemonic: String,
    pub stake_address: String,
    pub reward_address: String,
}

/// Seed both wallets and derive the pool addresses
pub fn provision_master(rpc: &RpcClient, run: &RunConfig) -> Result<ProvisionedWallets, String> {
    let stake_mnemonic = seed_wallet(rpc, STAKE_WALLET, run.stake_wallet_mnemonic.as_deref())?;
    let reward_mnemonic = seed_wallet(rpc, REWARD_WALLET, run.reward_wallet_mnemonic.as_deref())?;

    let stake_address = derive_stake_address(rpc)?;
    log::info!("Stake address: {}", stake_address);

    let reward_address = as_address(&rpc.call(Some(REWARD_WALLET), &["getnewaddress"])?)?;
    log::info!("Reward address: {}", reward_address);

    // The reward wallet must never stake; the stake wallet directs its
    // rewards to the reward wallet's address.
    let disable = json!({"enabled": "false"}).to_string();
    rpc.call(
        Some(REWARD_WALLET),
        &["walletsettings", "stakingoptions", &disable],
    )?;

    let redirect = json!({"rewardaddress": reward_address}).to_string();
    rpc.call(
        Some(STAKE_WALLET),
        &["walletsettings", "stakingoptions", &redirect],
    )?;

    Ok(ProvisionedWallets {
        stake_mnemonic,
        reward_mnemonic,
        stake_address,
        reward_address,
    })
}

/// Import a master key into a wallet, generating a mnemonic when none is given
fn seed_wallet(
    rpc: &RpcClient,
    wallet: &str,
    mnemonic_override: Option<&str>,
) -> Result<String, String> {
    let mnemonic = match mnemonic_override {
        Some(phrase) => phrase.to_string(),
        None => {
            // Mnemonic generation is node-level, not tied to a wallet
            let generated = rpc.call(None, &["mnemonic", "new"])?;
            field_str(&generated, "mnemonic")?.to_string()
        }
    };

    rpc.call(Some(wallet), &["extkeyimportmaster", &mnemonic])?;
    log::info!("Imported master key into {}", wallet);

    Ok(mnemonic)
}

/// Derive a fresh address in the stake wallet and return its stake-only form
fn derive_stake_address(rpc: &RpcClient) -> Result<String, String> {
    let address = as_address(&rpc.call(Some(STAKE_WALLET), &["getnewaddress"])?)?;

    let info = rpc.call(Some(STAKE_WALLET), &["validateaddress", &address, "true"])?;
    Ok(field_str(&info, "stakeonly_address")?.to_string())
}

/// Localize a remote pool config and import its addresses watch-only
pub fn provision_observer(
    rpc: &RpcClient,
    settings: &CoreSettings,
    data_dir: &Path,
    pool_dir: &Path,
    mut remote: Value,
) -> Result<(), String> {
    if !remote.is_object() {
        return Err("Remote pool config is not a JSON object".to_string());
    }

    let pool_address = field_str(&remote, "pooladdress")?.to_string();
    let reward_address = field_str(&remote, "rewardaddress")?.to_string();

    let canonical_pool = validate_address(rpc, &pool_address)?;

    rpc.call(Some(STAKE_WALLET), &["importaddress", &canonical_pool])?;
    log::info!("Imported pool address {} into {}", canonical_pool, STAKE_WALLET);

    rpc.call(Some(REWARD_WALLET), &["importaddress", &reward_address])?;
    log::info!(
        "Imported reward address {} into {}",
        reward_address,
        REWARD_WALLET
    );

    localize_observer_settings(&mut remote, settings, data_dir);
    pool::write_pool_settings_value(pool_dir, &remote)?;

    Ok(())
}

/// Overwrite the location-specific fields of a fetched pool config
fn localize_observer_settings(remote: &mut Value, settings: &CoreSettings, data_dir: &Path) {
    if let Some(map) = remote.as_object_mut() {
        map.insert("mode".to_string(), Value::String("observer".to_string()));
        map.insert(
            "ghostbindir".to_string(),
            Value::String(settings.bin_dir.display().to_string()),
        );
        map.insert(
            "ghostdatadir".to_string(),
            Value::String(data_dir.display().to_string()),
        );
    }
}

/// Validate an address with the daemon and return its canonical form
fn validate_address(rpc: &RpcClient, address: &str) -> Result<String, String> {
    let info = rpc.call(None, &["validateaddress", address])?;

    if info.get("isvalid").and_then(Value::as_bool) != Some(true) {
        return Err(format!("Invalid address in pool config: {}", address));
    }

    Ok(field_str(&info, "address")?.to_string())
}

fn field_str<'a>(value: &'a Value, key: &str) -> Result<&'a str, String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Missing \"{}\" field in RPC response", key))
}

fn as_address(value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("Expected an address string, got {}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CoreSettings;
    use std::path::PathBuf;

    #[test]
    fn test_field_str_present() {
        let value = json!({"mnemonic": "abandon ability able"});
        assert_eq!(field_str(&value, "mnemonic").unwrap(), "abandon ability able");
    }

    #[test]
    fn test_field_str_missing() {
        let value = json!({"other": 1});
        let err = field_str(&value, "mnemonic").unwrap_err();
        assert!(err.contains("mnemonic"));
    }

    #[test]
    fn test_as_address_rejects_objects() {
        assert!(as_address(&json!({"address": "x"})).is_err());
        assert_eq!(as_address(&json!("GeNtTS")).unwrap(), "GeNtTS");
    }

    #[cfg(unix)]
    #[test]
    fn test_provision_master_rpc_sequence() {
        use crate::args::PoolMode;
        use crate::rpc::RpcClient;
        use crate::settings::Network;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let call_log = dir.path().join("calls.log");
        let settings = CoreSettings {
            bin_dir: dir.path().to_path_buf(),
            ..CoreSettings::default()
        };

        // Fake CLI: records every invocation, replays canned responses
        let script = r##"#!/bin/sh
printf '%s\n' "$*" >> __LOG__
wallet=""
cmd=""
for a in "$@"; do
  case "$a" in
    -rpcwallet=*) wallet="${a#-rpcwallet=}" ;;
    -*) ;;
    *) if [ -z "$cmd" ]; then cmd="$a"; fi ;;
  esac
done
case "$cmd" in
  mnemonic) echo '{"mnemonic": "abandon ability able"}' ;;
  getnewaddress)
    if [ "$wallet" = "pool_stake" ]; then echo plain_stake_addr; else echo reward_addr; fi ;;
  validateaddress) echo '{"isvalid": true, "address": "plain_stake_addr", "stakeonly_address": "stakeonly_addr"}' ;;
  *) echo '{}' ;;
esac
"##
        .replace("__LOG__", &call_log.display().to_string());

        let cli = settings.cli_path();
        fs::write(&cli, script).unwrap();
        fs::set_permissions(&cli, fs::Permissions::from_mode(0o755)).unwrap();

        let rpc = RpcClient::new(&settings, dir.path(), Network::Testnet);
        let run = RunConfig {
            data_dir: None,
            pool_dir: None,
            network: Network::Testnet,
            mode: PoolMode::Master,
            stake_wallet_mnemonic: None,
            reward_wallet_mnemonic: None,
            config_url: None,
            warnings: Vec::new(),
        };

        let wallets = provision_master(&rpc, &run).unwrap();

        // The pool address is the stake-only transform, never the raw address
        assert_eq!(wallets.stake_address, "stakeonly_addr");
        assert_eq!(wallets.reward_address, "reward_addr");
        assert_eq!(wallets.stake_mnemonic, "abandon ability able");
        assert_eq!(wallets.reward_mnemonic, "abandon ability able");

        let calls = fs::read_to_string(&call_log).unwrap();
        let lines: Vec<&str> = calls.lines().collect();

        // Mnemonic generation is issued without a wallet scope
        assert!(lines
            .iter()
            .any(|l| l.ends_with("mnemonic new") && !l.contains("-rpcwallet")));

        assert!(lines
            .iter()
            .any(|l| l.contains("-rpcwallet=pool_stake") && l.ends_with("extkeyimportmaster abandon ability able")));
        assert!(lines
            .iter()
            .any(|l| l.contains("-rpcwallet=pool_reward") && l.ends_with("extkeyimportmaster abandon ability able")));

        // Staking disabled on the reward wallet, rewards redirected from the
        // stake wallet to the reward address
        let disable = lines.iter().position(|l| {
            l.contains("-rpcwallet=pool_reward")
                && l.contains("stakingoptions")
                && l.contains("\"enabled\":\"false\"")
        });
        let redirect = lines.iter().position(|l| {
            l.contains("-rpcwallet=pool_stake")
                && l.contains("stakingoptions")
                && l.contains("\"rewardaddress\":\"reward_addr\"")
        });
        assert!(disable.is_some());
        assert!(redirect.is_some());
        assert!(redirect.unwrap() > disable.unwrap());
    }

    #[test]
    fn test_localize_observer_settings() {
        let settings = CoreSettings {
            bin_dir: PathBuf::from("/opt/ghost/bin"),
            ..CoreSettings::default()
        };
        let mut remote = json!({
            "mode": "master",
            "ghostbindir": "/home/pool/ghost-binaries",
            "ghostdatadir": "/home/pool/.ghost",
            "pooladdress": "gcs1qpool",
            "rewardaddress": "Greward",
            "htmlport": 9000
        });

        localize_observer_settings(&mut remote, &settings, Path::new("/var/lib/ghost"));

        assert_eq!(remote["mode"], "observer");
        assert_eq!(remote["ghostbindir"], "/opt/ghost/bin");
        assert_eq!(remote["ghostdatadir"], "/var/lib/ghost");
        assert_eq!(remote["pooladdress"], "gcs1qpool");
        assert_eq!(remote["rewardaddress"], "Greward");
        assert_eq!(remote["htmlport"], 9000);
    }
}
