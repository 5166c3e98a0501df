//! Daemon process management
//!
//! Starts the node daemon in an isolated configuration (no peers, no staking)
//! for wallet provisioning, waits for its RPC interface to come up, and makes
//! sure it is asked to stop again whatever happens in between.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use sysinfo::System;

use crate::rpc::RpcClient;
use crate::settings::{CoreSettings, Network};

const READY_ATTEMPTS: u32 = 10;
const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Check whether a daemon process with the given name is already running
pub fn is_daemon_running(daemon_name: &str) -> bool {
    let mut system = System::new_all();
    system.refresh_all();

    system
        .processes()
        .values()
        .any(|p| p.name().to_string_lossy() == daemon_name)
}

/// Arguments the daemon is started with during provisioning
fn daemon_args(data_dir: &Path) -> Vec<String> {
    vec![
        "-daemon".to_string(),
        "-noconnect".to_string(),
        "-nostaking".to_string(),
        "-nodnsseed".to_string(),
        format!("-datadir={}", data_dir.display()),
    ]
}

/// Start the daemon detached and return a handle that stops it on drop
pub fn start_daemon(
    settings: &CoreSettings,
    data_dir: &Path,
    network: Network,
) -> Result<DaemonHandle, String> {
    if is_daemon_running(&settings.daemon_name) {
        return Err(format!(
            "{} is already running, stop it before preparing the pool",
            settings.daemon_name
        ));
    }

    let daemon_path = settings.daemon_path();
    log::info!("Starting {}", daemon_path.display());

    let output = Command::new(&daemon_path)
        .args(daemon_args(data_dir))
        .output()
        .map_err(|e| format!("Failed to start {}: {}", daemon_path.display(), e))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        return Err(format!(
            "{} failed to start: {}",
            settings.daemon_name,
            stderr.trim()
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        log::info!("{}", stdout.trim());
    }

    Ok(DaemonHandle {
        rpc: RpcClient::new(settings, data_dir, network),
        stopped: false,
    })
}

/// Handle to a running daemon
///
/// Dropping the handle without calling [`DaemonHandle::stop`] still issues a
/// best-effort stop, so provisioning errors never leave the daemon behind.
#[derive(Debug)]
pub struct DaemonHandle {
    rpc: RpcClient,
    stopped: bool,
}

impl DaemonHandle {
    /// Poll the RPC interface until the daemon responds
    ///
    /// Gives up silently after the poll budget is spent; the first real RPC
    /// command will surface the failure with a useful error.
    pub async fn await_ready(&self) {
        for attempt in 1..=READY_ATTEMPTS {
            tokio::time::sleep(READY_POLL_INTERVAL).await;

            if self.rpc.is_ready() {
                log::info!("Daemon ready after {} attempt(s)", attempt);
                return;
            }
        }
        log::debug!("Daemon not ready after {} attempts", READY_ATTEMPTS);
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Stop the daemon, consuming the handle
    pub fn stop(mut self) -> Result<(), String> {
        self.stopped = true;
        log::info!("Stopping daemon");
        self.rpc.stop()
    }
}

impl Drop for DaemonHandle {
    fn drop(&mut self) {
        if !self.stopped {
            if let Err(e) = self.rpc.stop() {
                log::warn!("Failed to stop daemon: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_daemon_args() {
        let args = daemon_args(&PathBuf::from("/tmp/pool"));
        assert_eq!(
            args,
            vec![
                "-daemon",
                "-noconnect",
                "-nostaking",
                "-nodnsseed",
                "-datadir=/tmp/pool"
            ]
        );
    }

    #[test]
    fn test_unlikely_daemon_name_is_not_running() {
        assert!(!is_daemon_running("no-such-daemon-ax91"));
    }

    #[cfg(unix)]
    fn recording_rpc(dir: &Path, call_log: &Path) -> RpcClient {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let settings = CoreSettings {
            bin_dir: dir.to_path_buf(),
            ..CoreSettings::default()
        };

        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$*\" >> {}\necho '{{}}'\n",
            call_log.display()
        );
        let cli = settings.cli_path();
        fs::write(&cli, script).unwrap();
        fs::set_permissions(&cli, fs::Permissions::from_mode(0o755)).unwrap();

        RpcClient::new(&settings, dir, Network::Testnet)
    }

    #[cfg(unix)]
    #[test]
    fn test_dropped_handle_stops_daemon_once() {
        use std::fs;
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let call_log = dir.path().join("calls.log");

        // Error paths drop the handle without an explicit stop
        let handle = DaemonHandle {
            rpc: recording_rpc(dir.path(), &call_log),
            stopped: false,
        };
        drop(handle);

        let calls = fs::read_to_string(&call_log).unwrap();
        let stops = calls.lines().filter(|l| l.ends_with("stop")).count();
        assert_eq!(stops, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_explicit_stop_is_not_repeated_on_drop() {
        use std::fs;
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let call_log = dir.path().join("calls.log");

        let handle = DaemonHandle {
            rpc: recording_rpc(dir.path(), &call_log),
            stopped: false,
        };
        handle.stop().unwrap();

        let calls = fs::read_to_string(&call_log).unwrap();
        let stops = calls.lines().filter(|l| l.ends_with("stop")).count();
        assert_eq!(stops, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_start_daemon_fails_on_stderr() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let settings = CoreSettings {
            bin_dir: dir.path().to_path_buf(),
            ..CoreSettings::default()
        };

        let daemon = settings.daemon_path();
        fs::write(&daemon, "#!/bin/sh\necho 'Error: bad datadir' >&2\n").unwrap();
        fs::set_permissions(&daemon, fs::Permissions::from_mode(0o755)).unwrap();

        let result = start_daemon(&settings, dir.path(), Network::Testnet);
        assert!(result.unwrap_err().contains("bad datadir"));
    }
}
