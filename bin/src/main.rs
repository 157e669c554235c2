use std::path::PathBuf;

use clap::Parser;
use eyre::Result;
use spill_common::{
    config::{SinkConfig, SpillConfig, CONFIG_ENV},
    logging::initialize_tracing_log,
};
use spill_relay::start_spill_server;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "spill-server")]
#[command(about = "Relays anonymous spills from the web form to the moderators", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, short, env = CONFIG_ENV)]
    config: PathBuf,

    /// Load and validate the config, then exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = SpillConfig::load(&cli.config)?;
    if cli.check {
        println!("Config OK: {}", cli.config.display());
        return Ok(());
    }

    let _guard = initialize_tracing_log(&config.logs)?;

    info!(
        port = config.port,
        sink = match config.sink {
            SinkConfig::Webhook(_) => "webhook",
            SinkConfig::Smtp(_) => "smtp",
        },
        behind_reverse_proxy = config.behind_reverse_proxy,
        metrics_port = ?config.metrics_port,
        "Loaded and validated spill configuration"
    );

    if let Err(e) = start_spill_server(config).await {
        error!("Spill server error: {}", e);
        return Err(e);
    }

    info!("Spill server shutdown complete");
    Ok(())
}
