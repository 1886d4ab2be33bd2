//! DrishtiIO - Vision processing daemon for robot camera streaming
//!
//! ## Protocol Architecture
//!
//! - **Frame channel (TCP, port 11000)**: Inbound JPEG camera frames
//! - **Control channel (TCP, port 11001)**: Outbound JSON detections
//!
//! A control client's IP is registered when it connects; every frame the
//! frame server processes is answered through the registered control writer
//! for the sending IP, if one exists.

use drishti_io::app::VisionApp;
use drishti_io::config::AppConfig;
use drishti_io::error::{Error, Result};
use std::env;
use std::path::Path;
use std::sync::atomic::Ordering;

/// Resolve the configuration file path from the command line.
///
/// Accepted forms, first match wins: `--config <path>` / `-c <path>`,
/// then a bare positional path. Everything else falls through to
/// `/etc/drishti.toml`.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    // The flag form takes precedence over a positional path
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    // A leading '-' marks an unrecognized flag, not a path
    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "/etc/drishti.toml".to_string()
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("DrishtiIO v0.3.0 starting...");

    // Load configuration; the default path is allowed to be absent
    let config_path = parse_config_path();
    let config = if Path::new(&config_path).exists() {
        log::info!("Using config: {}", config_path);
        AppConfig::from_file(&config_path)?
    } else {
        log::info!("Config {} not found, using defaults", config_path);
        AppConfig::default()
    };

    log::info!(
        "Strategy: {:?}, framing: {:?}",
        config.detection.strategy,
        config.network.framing
    );

    let app = VisionApp::new(&config)?;

    // Set up shutdown signal handler
    let running = app.shutdown_flag();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        running.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    log::info!("DrishtiIO running. Press Ctrl-C to stop.");
    app.run()?;

    log::info!("DrishtiIO stopped");
    Ok(())
}
