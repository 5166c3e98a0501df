//! RPC access to the node daemon
//!
//! Calls go through the node's CLI tool rather than a raw HTTP client, so the
//! daemon's cookie auth and network selection are handled by the CLI itself.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;

use crate::settings::{CoreSettings, Network};

/// Client for issuing RPC commands through the node CLI
#[derive(Debug)]
pub struct RpcClient {
    cli_path: PathBuf,
    data_dir: PathBuf,
    network: Network,
}

impl RpcClient {
    pub fn new(settings: &CoreSettings, data_dir: &Path, network: Network) -> Self {
        Self {
            cli_path: settings.cli_path(),
            data_dir: data_dir.to_path_buf(),
            network,
        }
    }

    /// Issue an RPC command, optionally against a named wallet
    pub fn call(&self, wallet: Option<&str>, args: &[&str]) -> Result<Value, String> {
        let mut command = Command::new(&self.cli_path);
        command.arg(format!("-datadir={}", self.data_dir.display()));

        if self.network != Network::Mainnet {
            command.arg(format!("-{}", self.network.as_str()));
        }

        if let Some(wallet) = wallet {
            command.arg(format!("-rpcwallet={}", wallet));
        }

        command.args(args);

        log::debug!("RPC call: {:?}", args);

        let output = command
            .output()
            .map_err(|e| format!("Failed to run {}: {}", self.cli_path.display(), e))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() || !stderr.trim().is_empty() {
            return Err(format!(
                "RPC command {:?} failed: {}",
                args.first().unwrap_or(&""),
                stderr.trim()
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let value = parse_rpc_output(&stdout);

        if let Some(error) = value.get("error") {
            if !error.is_null() {
                return Err(format!(
                    "RPC command {:?} returned error: {}",
                    args.first().unwrap_or(&""),
                    error
                ));
            }
        }

        Ok(value)
    }

    /// Probe whether the daemon is accepting RPC commands
    pub fn is_ready(&self) -> bool {
        self.call(None, &["getblockchaininfo"]).is_ok()
    }

    /// Ask the daemon to shut down
    pub fn stop(&self) -> Result<(), String> {
        self.call(None, &["stop"])?;
        Ok(())
    }
}

/// Parse CLI output as JSON, falling back to a plain string
///
/// Commands like `getnewaddress` print a bare value rather than a JSON
/// document, so parse failures are not errors.
fn parse_rpc_output(stdout: &str) -> Value {
    let trimmed = stdout.trim();
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}
