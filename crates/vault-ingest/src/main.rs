//! Vault Ingest - Main entry point

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::process;
use tokio::signal;
use tracing::{error, info, warn};
use vault_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use vault_ingest::bag::Bag;
use vault_ingest::config::Config;
use vault_ingest::ingest_area::IngestArea;
use vault_ingest::task::TaskOutcome;
use vault_ingest::{Cli, Commands};

#[tokio::main]
async fn main() {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Info };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("vault-ingest")
        .filter_directives("reqwest=info,hyper=info")
        .build();

    // Environment variables take precedence unless --verbose was given
    let log_config = if cli.verbose {
        log_config
    } else {
        LogConfig::from_env().unwrap_or(log_config)
    };

    if let Err(e) = init_logging(&log_config) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run => {
            let config = Config::load(&cli.config)?;
            let area = IngestArea::from_config(&config)?;
            area.start();
            info!(inbox = %area.inbox().display(), "Vault ingest running; press Ctrl+C to stop");

            shutdown_signal().await;

            if area.shutdown().await {
                info!("Vault ingest shut down gracefully");
            } else {
                warn!("Vault ingest shut down with tasks still running");
            }
            Ok(())
        },
        Commands::Ingest { deposit_dir } => {
            let config = Config::load(&cli.config)?;
            let area = IngestArea::from_config(&config)?;
            let outcome = area.ingest_one(deposit_dir).await;
            area.shutdown().await;

            match outcome? {
                TaskOutcome::Accepted { zip } => {
                    println!("ACCEPTED {}", zip.display());
                    Ok(())
                },
                TaskOutcome::Rejected(message) => bail!("Deposit rejected: {}", message),
                TaskOutcome::Failed(message) => bail!("Deposit failed: {}", message),
                TaskOutcome::Cancelled => bail!("Ingest cancelled"),
            }
        },
        Commands::VerifyBag { bag_dir } => {
            let bag = Bag::read(bag_dir).with_context(|| format!("Failed to read bag {}", bag_dir.display()))?;
            let problems = bag.verify()?;
            if problems.is_empty() {
                println!("{} is valid", bag_dir.display());
                return Ok(());
            }
            for problem in &problems {
                println!("{}", problem);
            }
            bail!("{} has {} problem(s)", bag_dir.display(), problems.len())
        },
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
