use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use stormwatch::{AppState, StormwatchConfig, StormwatchError, VERSION, telemetry, web};

/// Weather, alert and hurricane aggregation service
#[derive(Debug, Parser)]
#[command(name = "stormwatch", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match StormwatchConfig::load(cli.config) {
        Ok(config) => config,
        Err(err) => {
            match err.downcast_ref::<StormwatchError>() {
                Some(config_err) => eprintln!("{}", config_err.user_message()),
                None => eprintln!("{err:#}"),
            }
            return Err(err).context("Failed to load configuration");
        }
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let telemetry = telemetry::init(&config.logging, &config.telemetry)?;
    info!(
        version = VERSION,
        weather_key = config.providers.weather_api_key.is_some(),
        maps_key = config.providers.maps_api_key.is_some(),
        otlp = telemetry.is_exporting(),
        "Starting stormwatch"
    );

    let state = AppState::from_config(&config)?;
    let served = web::run(state, &config.server).await;

    telemetry.shutdown();
    served.context("Web server failed")
}
