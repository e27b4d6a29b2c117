//! mtfleet
//!
//! Updates RouterOS packages and routerboard firmware across a fleet of
//! MikroTik routers over SSH, one sweep at a time.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use kameo::actor::Spawn;
use mtfleet_core::{OrchestratorActor, OrchestratorActorArgs, RunSweep, SweepKind};
use tokio::sync::watch;
use tracing::{info, warn};

mod config;
mod factory;
mod logging;

use config::Config;

#[derive(Parser)]
#[command(name = "mtfleet")]
#[command(about = "Update MikroTik RouterOS packages and firmware over SSH", long_about = None)]
struct Cli {
    /// Configuration file (defaults to MTFLEET_CONFIG or the standard locations)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Flip the shutdown flag on Ctrl-C or SIGTERM
async fn watch_signals(shutdown: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("shutdown requested, finishing devices in progress");
    shutdown.send_replace(true);
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let path = Config::locate(cli.config);
    let mut config = match &path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply_env();

    let _log_guard = logging::init(&config.logging)?;
    match &path {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => warn!("no config file found, using defaults"),
    }
    config.validate()?;

    let inventory = config.inventory();
    let fleet = config.fleet_config();
    let workflow = factory::build_workflow(&config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(watch_signals(shutdown_tx));

    info!(devices = inventory.len(), "mtfleet starting");

    let orchestrator = OrchestratorActor::spawn(OrchestratorActorArgs {
        inventory,
        workflow,
        config: fleet.clone(),
        shutdown: shutdown_rx.clone(),
    });

    let mut sweeps = vec![SweepKind::PackageUpdate, SweepKind::FirmwareUpgrade];
    if fleet.disable_remote_shell {
        sweeps.push(SweepKind::RemoteShellLockdown);
    }

    for kind in sweeps {
        if *shutdown_rx.borrow() {
            warn!(sweep = %kind, "sweep not started, shutting down");
            break;
        }

        // Per-device failures are in the summary and never fail the run
        orchestrator
            .ask(RunSweep { kind })
            .await
            .map_err(|e| eyre::eyre!("{kind} sweep failed: {e}"))?;
    }

    orchestrator
        .stop_gracefully()
        .await
        .map_err(|e| eyre::eyre!("failed to stop orchestrator: {e}"))?;

    info!("mtfleet finished");
    Ok(())
}
