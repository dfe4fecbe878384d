//! DHT22 → MQTT telemetry bridge - entry point.

use clap::{Parser, Subcommand};
use dht_bridge::config::BridgeConfig;
use dht_bridge::logging::init_default_logging;
use dht_bridge::sensor::Dht22Sensor;
use dht_bridge::transport::{mqtt::MqttPublisher, Publisher};
use dht_bridge::Bridge;
use std::path::PathBuf;
use std::process;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// DHT22 temperature/humidity to MQTT telemetry bridge
#[derive(Parser)]
#[command(name = "dht-bridge")]
#[command(about = "Publishes DHT22 sensor readings to an MQTT broker")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge
    Run,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("starting dht-bridge v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_bridge(config).await,
        Commands::Config { show } => handle_config_command(&config, show),
    };

    if let Err(e) = result {
        error!("command failed: {e}");
        process::exit(1);
    }

    info!("shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<BridgeConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            Ok(BridgeConfig::load_from_file(path)?)
        }
        None => {
            for path_str in ["bridge.toml", "config/bridge.toml"] {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("loading configuration from {}", path.display());
                    return Ok(BridgeConfig::load_from_file(&path)?);
                }
            }
            Err("no configuration file found; pass -c/--config or create bridge.toml".into())
        }
    }
}

async fn run_bridge(config: BridgeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sensor = Dht22Sensor::new(config.sensor.gpio_pin);
    info!(pin = config.sensor.gpio_pin, "sensor bound to GPIO pin");

    let mut publisher = MqttPublisher::new("dht-bridge", &config.mqtt)?;
    info!(broker = %config.mqtt.broker_url, "connecting to MQTT broker...");
    publisher.connect().await?;

    // Interrupt handling: the signal task flips the shutdown flag and the
    // poll loop unwinds through its normal exit path.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!("signal handler error: {e}");
        }
        let _ = shutdown_tx.send(true);
    });

    info!("reading sensor; press Ctrl+C to exit");

    let mut bridge = Bridge::new(sensor, publisher, &config);
    bridge.run(shutdown_rx).await;

    // Teardown runs exactly once, on every exit route out of the loop.
    bridge.shutdown().await?;
    Ok(())
}

async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => info!("received SIGINT, shutting down..."),
        _ = sigterm.recv() => info!("received SIGTERM, shutting down..."),
    }
    Ok(())
}

fn handle_config_command(
    config: &BridgeConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("{}", toml::to_string_pretty(config)?);
    }
    info!("configuration is valid");
    Ok(())
}
