//! # LoRa Ground Station
//!
//! Ground-station side of a half-duplex LoRa telemetry link.
//!
//! Telemetry renderings, link quality, GPS status and command diagnostics
//! go to stdout for the operator. Operator commands are read from stdin.
//! Diagnostics go to stderr (and optionally a daily log file).

use anyhow::{Context, Result};
use std::io::ErrorKind;
use tokio::io::AsyncReadExt;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use lora_ground_station::config::{Config, GpsConfig, LoggingConfig};
use lora_ground_station::console::Console;
use lora_ground_station::error::GroundStationError;
use lora_ground_station::gps::composer::NO_FIX_LINE;
use lora_ground_station::gps::WatchGpsSource;
use lora_ground_station::link::{LinkTurnController, TurnSettings};
use lora_ground_station::serial::SerialRadio;
use lora_ground_station::station::GroundStation;

/// Configuration file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Period of the GPS and heartbeat timer checks
const HOUSEKEEPING_PERIOD_MS: u64 = 50;

/// Operator input read size
const STDIN_CHUNK_SIZE: usize = 256;

/// File name prefix of the rotated diagnostic log
const LOG_FILE_PREFIX: &str = "ground-station.log";

/// Main entry point for the ground station
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (defaults when the file is missing)
///    - Set up logging
///    - Open the LoRa modem; a failure halts the link but the station keeps
///      running so the operator sees why
///
/// 2. **Main Loop** (single task, branches polled in order)
///    - Ctrl+C
///    - Operator input from stdin
///    - Link poll: one turn per received frame
///    - Housekeeping: GPS status line and heartbeat
///
/// # Errors
///
/// Returns error if the configuration file exists but is invalid.
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let (config, missing_config) = match Config::load(&config_path) {
        Ok(config) => (config, false),
        Err(GroundStationError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            (Config::default(), true)
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Invalid configuration in {}", config_path))
        }
    };

    let _log_guard = init_logging(&config.logging);

    info!("LoRa Ground Station v{} starting...", env!("CARGO_PKG_VERSION"));
    if missing_config {
        warn!("Configuration file {} not found, using defaults", config_path);
    } else {
        info!("Loaded configuration from {}", config_path);
    }

    let settings = TurnSettings::from_config(&config.link, &config.radio);
    if let Some(period) = settings.debug_interval {
        info!("Debug receive mode: running a link turn every {:?}", period);
    }

    let radio = SerialRadio::open(&config.serial, &config.radio).await;
    let link = LinkTurnController::from_init(radio, settings);

    // Nothing publishes into this sender until a GPS decoder is attached
    let (_gps_publisher, gps_source) = WatchGpsSource::channel();
    if let Some(notice) = gps_decoder_notice(&config.gps) {
        warn!("{}", notice);
    }

    let mut station = GroundStation::new(&config, link, gps_source, Console::stdout());

    let mut link_poll = interval(Duration::from_millis(config.link.poll_interval_ms));
    link_poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut housekeeping = interval(Duration::from_millis(HOUSEKEEPING_PERIOD_MS));
    housekeeping.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut stdin = tokio::io::stdin();
    let mut input = [0u8; STDIN_CHUNK_SIZE];
    let mut stdin_open = true;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Station ready, type commands followed by Enter (Ctrl+C to exit)");

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }

            // Commands are ingested before the next turn can run
            read = stdin.read(&mut input), if stdin_open => match read {
                Ok(0) => {
                    info!("Operator input closed, continuing without commands");
                    stdin_open = false;
                }
                Ok(n) => {
                    station.ingest_operator_bytes(&input[..n]);
                }
                Err(e) => {
                    warn!("Failed to read operator input: {}", e);
                    stdin_open = false;
                }
            },

            _ = link_poll.tick() => {
                station.service_link().await;
            }

            _ = housekeeping.tick() => {
                station.service_timers(Instant::now());
            }
        }
    }

    let stats = station.link().stats();
    info!(
        "Total turns: {} ({} skipped, {} tx failures)",
        stats.turns, stats.skipped, stats.tx_failures
    );

    Ok(())
}

/// Startup notice for the GPS status line, which has no decoder feeding it
fn gps_decoder_notice(config: &GpsConfig) -> Option<String> {
    config.enabled.then(|| {
        format!(
            "No GPS decoder attached: status lines will read \"{}\" (set gps.enabled = false to silence)",
            NO_FIX_LINE
        )
    })
}

/// Stderr logging plus an optional daily-rotated file.
///
/// `RUST_LOG` overrides the configured level. The returned guard must be
/// held for the life of the program so the file writer flushes.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}
