use std::fs;
use std::path::PathBuf;
use std::process::exit;

use coldstakepool_prepare::args::{self, Command, PoolMode, RunConfig};
use coldstakepool_prepare::{
    conf, daemon, downloader, expand_path, extractor, logging, pool, provision, CoreSettings,
    Network,
};

#[tokio::main]
async fn main() {
    let raw_args: Vec<String> = std::env::args().skip(1).collect();

    let command = match args::parse(&raw_args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    };

    let result = match command {
        Command::Help => {
            println!("{}", args::help_text());
            Ok(())
        }
        Command::Version => {
            println!("coldstakepool-prepare {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::DownloadCore => with_logging(|settings| download_only(settings)).await,
        Command::UpdateCore => with_logging(|settings| update_core(settings)).await,
        Command::Run(run) => with_logging(|settings| run_prepare(settings, run)).await,
    };

    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        exit(1);
    }
}

/// Read the core settings, set up logging, then run the selected workflow
async fn with_logging<F, Fut>(workflow: F) -> Result<(), String>
where
    F: FnOnce(CoreSettings) -> Fut,
    Fut: std::future::Future<Output = Result<(), String>>,
{
    let settings = CoreSettings::from_env();
    logging::init_logger(settings.bin_dir.join("logs"))?;
    workflow(settings).await
}

async fn download_only(settings: CoreSettings) -> Result<(), String> {
    downloader::download_core(&settings).await?;
    Ok(())
}

async fn update_core(settings: CoreSettings) -> Result<(), String> {
    let archive = downloader::download_core(&settings).await?;
    extractor::install_core(&settings, &archive)
}

/// Where the node and pool data live for this run
fn resolve_directories(run: &RunConfig) -> (PathBuf, PathBuf) {
    let (data_dir, data_dir_defaulted) = match &run.data_dir {
        Some(dir) => (dir.clone(), false),
        None => (expand_path("~/.ghost"), true),
    };

    // The daemon keeps non-mainnet chain state in a subdirectory, so a
    // defaulted pool dir follows it there.
    let pool_dir = match &run.pool_dir {
        Some(dir) => dir.clone(),
        None if data_dir_defaulted && run.network != Network::Mainnet => data_dir
            .join(run.network.as_str())
            .join("stakepool"),
        None => data_dir.join("stakepool"),
    };

    (data_dir, pool_dir)
}

async fn run_prepare(settings: CoreSettings, run: RunConfig) -> Result<(), String> {
    for warning in &run.warnings {
        log::warn!("{}", warning);
    }

    let archive = downloader::download_core(&settings).await?;
    extractor::install_core(&settings, &archive)?;

    let (data_dir, pool_dir) = resolve_directories(&run);
    log::info!("Node data dir: {}", data_dir.display());
    log::info!("Pool dir: {}", pool_dir.display());

    fs::create_dir_all(&data_dir).map_err(|e| format!("Failed to create data dir: {}", e))?;
    fs::create_dir_all(&pool_dir).map_err(|e| format!("Failed to create pool dir: {}", e))?;

    conf::write_daemon_conf(&settings, &data_dir, run.network)?;

    let handle = daemon::start_daemon(&settings, &data_dir, run.network)?;
    handle.await_ready().await;

    let provisioned = match run.mode {
        PoolMode::Observer => {
            // finish() guarantees a config url in observer mode
            let url = run.config_url.as_deref().unwrap_or_default();
            let remote = downloader::fetch_json(url).await?;
            let result = provision::provision_observer(
                handle.rpc(),
                &settings,
                &data_dir,
                &pool_dir,
                remote,
            );
            result.map(|_| None)
        }
        PoolMode::Master => provision::provision_master(handle.rpc(), &run).map(Some),
    };

    // The daemon is stopped whether provisioning succeeded or not; a
    // provisioning error takes precedence over a stop error.
    let stop_result = handle.stop();
    let provisioned = provisioned?;
    stop_result?;

    if let Some(wallets) = provisioned {
        let pool_settings =
            pool::PoolSettings::master(&settings.bin_dir, &data_dir, run.network, &wallets);
        pool::write_pool_settings(&pool_dir, &pool_settings)?;
        pool::print_summary(&wallets);
    }

    log::info!("Pool preparation complete");
    Ok(())
}
