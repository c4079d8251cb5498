use anyhow::Result;
use clap::Parser;

use netpulse_daemon::cli::DaemonCli;
use netpulse_daemon::logging;
use netpulse_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();
    let config = cli.load_config().await?;

    if cli.validate {
        println!("configuration is valid");
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "netpulse-daemon starting");

    let mut orchestrator = Orchestrator::build_from_config(config).await?;
    let reason = orchestrator.run(cli.ticks).await?;

    tracing::info!(reason = ?reason, "netpulse-daemon shut down");
    Ok(())
}
