mod args;
mod output;
mod progress;
mod runner;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::{fmt, EnvFilter};

use airhook_common::Interrupt;
use args::{Cli, Commands};
use runner::{run_attack, run_check, run_crack};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let interrupt = Interrupt::new();
    install_interrupt_handler(interrupt.clone()).context("Failed to install signal handlers")?;

    match cli.command {
        Commands::Run(args) => run_attack(args, interrupt).await?,
        Commands::Crack(args) => run_crack(args).await?,
        Commands::Check => run_check().await?,
    }

    Ok(())
}

/// First Ctrl+C or SIGTERM cancels the current capture and stops new
/// targets so the interface still gets restored. A second one exits at once.
fn install_interrupt_handler(interrupt: Interrupt) -> std::io::Result<()> {
    #[cfg(unix)]
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::spawn(async move {
        loop {
            #[cfg(unix)]
            let received = tokio::select! {
                r = tokio::signal::ctrl_c() => r.map(|()| "Ctrl+C"),
                _ = terminate.recv() => Ok("SIGTERM"),
            };
            #[cfg(not(unix))]
            let received = tokio::signal::ctrl_c().await.map(|()| "Ctrl+C");

            match received {
                Ok(name) if interrupt.is_triggered() => {
                    error!("{} received again, exiting without cleanup", name);
                    std::process::exit(130);
                }
                Ok(name) => {
                    warn!("{} received, finishing current step...", name);
                    interrupt.trigger();
                }
                Err(e) => {
                    warn!("Signal listener failed: {}", e);
                    return;
                }
            }
        }
    });
    Ok(())
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}
