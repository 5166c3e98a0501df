//! Command-line argument parsing
//!
//! Flags are described by a declarative table mapping each name to its arity
//! and setter. Unknown flags are collected as warnings rather than aborting;
//! invalid flag values and conflicting selections are fatal argument errors.

use std::path::PathBuf;

use url::Url;

use crate::expand_path;
use crate::settings::Network;

/// What the process was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Print usage and exit
    Help,
    /// Print the tool version and exit
    Version,
    /// Download and install the core release, then exit
    UpdateCore,
    /// Download the core release only, then exit
    DownloadCore,
    /// Run the full pool preparation workflow
    Run(RunConfig),
}

/// Operator mode the pool is initialised to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolMode {
    #[default]
    Master,
    Observer,
}

/// Validated run configuration, immutable after parsing
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub data_dir: Option<PathBuf>,
    pub pool_dir: Option<PathBuf>,
    pub network: Network,
    pub mode: PoolMode,
    pub stake_wallet_mnemonic: Option<String>,
    pub reward_wallet_mnemonic: Option<String>,
    pub config_url: Option<String>,
    /// Unrecognised arguments, reported but not fatal
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
struct Builder {
    command: Option<Command>,
    data_dir: Option<PathBuf>,
    pool_dir: Option<PathBuf>,
    network: Option<Network>,
    mode: Option<PoolMode>,
    stake_wallet_mnemonic: Option<String>,
    reward_wallet_mnemonic: Option<String>,
    config_url: Option<String>,
    warnings: Vec<String>,
}

struct FlagSpec {
    name: &'static str,
    alias: Option<&'static str>,
    takes_value: bool,
    apply: fn(&mut Builder, &str) -> Result<(), String>,
}

const FLAGS: &[FlagSpec] = &[
    FlagSpec {
        name: "help",
        alias: Some("h"),
        takes_value: false,
        apply: |b, _| {
            b.command = Some(Command::Help);
            Ok(())
        },
    },
    FlagSpec {
        name: "version",
        alias: Some("v"),
        takes_value: false,
        apply: |b, _| {
            b.command = Some(Command::Version);
            Ok(())
        },
    },
    FlagSpec {
        name: "update_core",
        alias: None,
        takes_value: false,
        apply: |b, _| {
            b.command = Some(Command::UpdateCore);
            Ok(())
        },
    },
    FlagSpec {
        name: "download_core",
        alias: None,
        takes_value: false,
        apply: |b, _| {
            b.command = Some(Command::DownloadCore);
            Ok(())
        },
    },
    FlagSpec {
        name: "mainnet",
        alias: None,
        takes_value: false,
        apply: |b, _| b.set_network(Network::Mainnet),
    },
    FlagSpec {
        name: "testnet",
        alias: None,
        takes_value: false,
        apply: |b, _| b.set_network(Network::Testnet),
    },
    FlagSpec {
        name: "regtest",
        alias: None,
        takes_value: false,
        apply: |b, _| b.set_network(Network::Regtest),
    },
    FlagSpec {
        name: "datadir",
        alias: None,
        takes_value: true,
        apply: |b, v| {
            b.data_dir = Some(expand_path(v));
            Ok(())
        },
    },
    FlagSpec {
        name: "pooldir",
        alias: None,
        takes_value: true,
        apply: |b, v| {
            b.pool_dir = Some(expand_path(v));
            Ok(())
        },
    },
    FlagSpec {
        name: "stake_wallet_mnemonic",
        alias: None,
        takes_value: true,
        apply: |b, v| {
            b.stake_wallet_mnemonic = Some(v.to_string());
            Ok(())
        },
    },
    FlagSpec {
        name: "reward_wallet_mnemonic",
        alias: None,
        takes_value: true,
        apply: |b, v| {
            b.reward_wallet_mnemonic = Some(v.to_string());
            Ok(())
        },
    },
    FlagSpec {
        name: "mode",
        alias: None,
        takes_value: true,
        apply: |b, v| {
            b.mode = Some(match v {
                "master" => PoolMode::Master,
                "observer" => PoolMode::Observer,
                other => return Err(format!("Unknown value for mode: {}", other)),
            });
            Ok(())
        },
    },
    FlagSpec {
        name: "configurl",
        alias: None,
        takes_value: true,
        apply: |b, v| {
            Url::parse(v).map_err(|e| format!("Invalid configurl {}: {}", v, e))?;
            b.config_url = Some(v.to_string());
            Ok(())
        },
    },
];

impl Builder {
    fn set_network(&mut self, network: Network) -> Result<(), String> {
        match self.network {
            Some(existing) if existing != network => Err(format!(
                "Conflicting network selection: {} and {}",
                existing.as_str(),
                network.as_str()
            )),
            _ => {
                self.network = Some(network);
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<Command, String> {
        if let Some(command) = self.command {
            return Ok(command);
        }

        let mode = self.mode.unwrap_or_default();
        if mode == PoolMode::Observer && self.config_url.is_none() {
            return Err("observer mode requires configurl set".to_string());
        }

        Ok(Command::Run(RunConfig {
            data_dir: self.data_dir,
            pool_dir: self.pool_dir,
            network: self.network.unwrap_or_default(),
            mode,
            stake_wallet_mnemonic: self.stake_wallet_mnemonic,
            reward_wallet_mnemonic: self.reward_wallet_mnemonic,
            config_url: self.config_url,
            warnings: self.warnings,
        }))
    }
}

fn find_flag(name: &str) -> Option<&'static FlagSpec> {
    FLAGS
        .iter()
        .find(|f| f.name == name || f.alias == Some(name))
}

/// Parse command-line arguments into a [`Command`]
pub fn parse(args: &[String]) -> Result<Command, String> {
    let mut builder = Builder::default();

    for arg in args {
        if arg.len() < 2 || !arg.starts_with('-') {
            builder.warnings.push(format!("Unknown argument {}", arg));
            continue;
        }

        // At most two leading dashes; anything deeper is not a flag
        let stripped = arg
            .strip_prefix("--")
            .or_else(|| arg.strip_prefix('-'))
            .unwrap_or(arg.as_str());
        let (name, value) = match stripped.split_once('=') {
            Some((n, v)) => (n.trim(), Some(v)),
            None => (stripped.trim(), None),
        };

        match find_flag(name) {
            Some(spec) if spec.takes_value == value.is_some() => {
                (spec.apply)(&mut builder, value.unwrap_or(""))?;
            }
            _ => builder.warnings.push(format!("Unknown argument {}", arg)),
        }

        // Command flags short-circuit the remaining arguments
        if builder.command.is_some() {
            break;
        }
    }

    builder.finish()
}

/// Usage text printed for --help
pub fn help_text() -> String {
    [
        "Usage: coldstakepool-prepare ",
        "",
        "--help, -h                 Print help.",
        "--version, -v              Print version.",
        "--update_core              Download, verify and extract the core release and exit.",
        "--download_core            Download and verify the core release and exit.",
        "--datadir=PATH             Path to the node data directory, default:~/.ghost.",
        "--pooldir=PATH             Path to the stakepool data directory, default:{datadir}/stakepool.",
        "--mainnet                  Run the node in mainnet mode.",
        "--testnet                  Run the node in testnet mode.",
        "--regtest                  Run the node in regtest mode.",
        "--stake_wallet_mnemonic=   Recovery phrase to use for the staking wallet, default is randomly generated.",
        "--reward_wallet_mnemonic=  Recovery phrase to use for the reward wallet, default is randomly generated.",
        "--mode=master/observer     Mode the stakepool is initialised to. observer mode requires configurl to be specified, default:master.",
        "--configurl=url            Url to pull the stakepool config file from when initialising for observer mode.",
        "",
    ]
    .join("\n")
}
