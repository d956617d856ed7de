//! Breach overlay binary.
//!
//! Wires the breach tracker to a simulated world and a text frame output,
//! then runs the frame loop until the frame limit is reached or Ctrl-C is
//! pressed.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `breach-overlay.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Load the `simulation` section and build the simulated world
//! 4. Create the tracker and frame state
//! 5. Select the frame output adapter
//! 6. Run the frame loop
//! 7. Log the result

mod error;
mod presenter;
mod simulated;

use std::path::{Path, PathBuf};

use breach_core::clock::MonotonicTime;
use breach_core::config::{LoggingConfig, OverlayConfig};
use breach_core::runner;
use breach_core::tick::OverlayState;
use breach_core::tracker::EventTracker;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::OverlayError;
use crate::simulated::{SimulatedWorld, SimulationConfig};

/// Default configuration file, relative to the working directory.
const CONFIG_FILE: &str = "breach-overlay.yaml";

/// Application entry point for the overlay.
///
/// # Errors
///
/// Returns an error if configuration, logging setup, or the frame loop
/// fails.
#[tokio::main]
async fn main() -> Result<(), OverlayError> {
    // 1. Load configuration.
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;

    info!(
        path = %config_path.display(),
        type_path = config.tracker.type_path,
        validity_window_ms = config.tracker.validity_window_ms,
        display_cap = config.display.display_cap,
        frame_interval_ms = config.runner.frame_interval_ms,
        max_ticks = config.runner.max_ticks,
        "breach-overlay starting"
    );

    // 3. Build the simulated world.
    let simulation = load_simulation_config(&config_path)?;
    info!(
        seed = simulation.seed,
        max_breaches = simulation.max_breaches,
        area_change_every = simulation.area_change_every,
        "Simulated world configured"
    );
    let mut world = SimulatedWorld::new(simulation, &config.tracker.type_path);

    // 4. Create tracker and frame state.
    let mut state = OverlayState::new(
        EventTracker::new(config.tracker_settings()),
        config.display_settings(),
    );

    // 5. Select frame output.
    let mut output = presenter::for_output(&config.logging.output);
    info!(output = config.logging.output, "Frame output selected");

    // 6. Run the frame loop.
    let time = MonotonicTime::new();
    let result = runner::run_overlay(
        &mut state,
        &mut world,
        &time,
        output.as_mut(),
        &config.runner,
        shutdown_signal(),
    )
    .await?;

    // 7. Log results.
    runner::log_overlay_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        open_breaches = world.open_breaches(),
        area = %world.area(),
        "breach-overlay shutdown complete"
    );

    Ok(())
}

/// Install the global log subscriber.
///
/// Logs go to stderr because JSON frame output owns stdout. With
/// `output: json` the log lines are JSON too.
fn init_logging(logging: &LoggingConfig) -> Result<(), OverlayError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if logging.output == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| OverlayError::Logging {
        message: format!("{e}"),
    })
}

/// Load the overlay configuration, falling back to defaults when the file
/// does not exist.
fn load_config(path: &Path) -> Result<OverlayConfig, OverlayError> {
    if path.exists() {
        Ok(OverlayConfig::from_file(path)?)
    } else {
        Ok(OverlayConfig::default())
    }
}

/// Load the `simulation` section of the config file.
///
/// A missing file or a file without a `simulation` key yields defaults.
fn load_simulation_config(path: &Path) -> Result<SimulationConfig, OverlayError> {
    if !path.exists() {
        return Ok(SimulationConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| OverlayError::Simulation {
        message: format!("failed to read config file: {e}"),
    })?;
    parse_simulation_config(&contents)
}

fn parse_simulation_config(contents: &str) -> Result<SimulationConfig, OverlayError> {
    if contents.trim().is_empty() {
        return Ok(SimulationConfig::default());
    }

    let raw: serde_yml::Value =
        serde_yml::from_str(contents).map_err(|e| OverlayError::Simulation {
            message: format!("failed to parse config YAML: {e}"),
        })?;

    let config = match raw.get("simulation") {
        Some(section) => serde_yml::from_value::<SimulationConfig>(section.clone()).map_err(
            |e| OverlayError::Simulation {
                message: format!("failed to parse simulation config: {e}"),
            },
        )?,
        None => SimulationConfig::default(),
    };

    config
        .validate()
        .map_err(|message| OverlayError::Simulation { message })?;
    Ok(config)
}

/// Resolves on Ctrl-C. If the signal handler cannot be installed the loop
/// runs until its frame limit.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
