//! Lifestream server binary.
//!
//! Wires the automaton, the board, the two periodic drivers, and the HTTP
//! server together and runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$LIFESTREAM_CONFIG` or
//!    `lifestream-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Seed generation 0 from the configured patterns
//! 4. Spawn the evolution driver, the broadcast driver, and the server
//! 5. Wait for `Ctrl-C` or a server failure
//! 6. Stop the drivers, cancel every viewer, and drain the tasks

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lifestream_core::config::{LogFormat, LoggingConfig};
use lifestream_core::{board, seed, Automaton, EvolutionDriver, LifestreamConfig, StopSignal};
use lifestream_hub::{AppState, BroadcastDriver, SubscriptionHub};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Config file read when `LIFESTREAM_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "lifestream-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, seeding, or the server fails.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Load configuration.
    let config_path = std::env::var_os("LIFESTREAM_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(config = %config_path.display(), "lifestream-server starting");

    // 3. Seed generation 0.
    let size = config.grid.size()?;
    let mut rng = config
        .seeding
        .rng_seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let cells = seed::initial_cells(size, &config.seeding, &mut rng)?;
    let automaton = Automaton::new(size);
    let genesis = automaton.genesis(cells)?;
    info!(
        width = size.width(),
        height = size.height(),
        alive = genesis.alive_count(),
        rng_seed = ?config.seeding.rng_seed,
        "Generation 0 seeded"
    );

    // 4. Wire the board, hub, and drivers.
    let (writer, reader) = board::channel(genesis);
    let hub = Arc::new(SubscriptionHub::new(size, &config.hub));
    let state = Arc::new(AppState::new(Arc::clone(&hub), reader.clone()));
    let stop = StopSignal::new();

    let evolution = tokio::spawn(
        EvolutionDriver::new(automaton, writer, config.timing.evolution_interval())
            .with_max_generations(config.timing.max_generations)
            .run(stop.clone()),
    );
    let broadcast = tokio::spawn(
        BroadcastDriver::new(Arc::clone(&hub), reader, config.timing.broadcast_interval())
            .run(stop.clone()),
    );
    let server_settings = config.server.clone();
    let server_stop = stop.clone();
    let mut server = tokio::spawn(async move {
        lifestream_hub::start_server(&server_settings, state, server_stop).await
    });

    // 5. Run until interrupted or the server dies.
    let server_result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Ctrl-C received, shutting down");
            None
        }
        result = &mut server => Some(result),
    };

    // 6. Shut down.
    stop.stop();
    let cancelled = hub.close_all();
    info!(viewers = cancelled, "Viewers disconnected");

    let report = evolution.await.map_err(task_error)?;
    let passes = broadcast.await.map_err(task_error)?;
    info!(
        last_generation = report.last_generation,
        alive = report.alive,
        broadcast_passes = passes,
        "Drivers stopped"
    );

    let served = match server_result {
        Some(result) => result,
        None => server.await,
    };
    match served.map_err(task_error)? {
        Ok(()) => {
            info!("lifestream-server stopped");
            Ok(())
        }
        Err(e) => {
            warn!("Server exited with error: {e}");
            Err(e.into())
        }
    }
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist. Environment overrides apply either way.
fn load_config(path: &Path) -> Result<LifestreamConfig, AppError> {
    let config = if path.exists() {
        LifestreamConfig::from_file(path)?
    } else {
        LifestreamConfig::parse("")?
    };
    Ok(config)
}

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over
/// the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn task_error(e: JoinError) -> AppError {
    AppError::Task {
        message: e.to_string(),
    }
}
