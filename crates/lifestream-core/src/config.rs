//! Configuration loading and typed config structures for Lifestream.
//!
//! The canonical configuration lives in `lifestream-config.yaml` in the
//! working directory. This module defines strongly-typed structs that mirror
//! the YAML structure, a loader, and validation. Every field has a default,
//! so an empty or missing file yields a runnable configuration.

use std::path::Path;
use std::time::Duration;

use lifestream_types::{GridError, GridSize};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

impl From<GridError> for ConfigError {
    fn from(source: GridError) -> Self {
        Self::Invalid {
            reason: source.to_string(),
        }
    }
}

/// Top-level configuration. Mirrors `lifestream-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LifestreamConfig {
    /// Board dimensions.
    #[serde(default)]
    pub grid: GridConfig,

    /// Evolution and broadcast periods.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Initial pattern seeding.
    #[serde(default)]
    pub seeding: SeedingConfig,

    /// Subscription hub delivery settings.
    #[serde(default)]
    pub hub: HubConfig,

    /// HTTP / WebSocket listener.
    #[serde(default)]
    pub server: ServerSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LifestreamConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the listener:
    /// - `LIFESTREAM_HOST` overrides `server.host`
    /// - `LIFESTREAM_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, apply environment
    /// overrides, and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config
            .server
            .apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.size()?;
        if self.timing.evolution_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "timing.evolution_interval_ms must be at least 1".to_owned(),
            });
        }
        if self.timing.broadcast_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "timing.broadcast_interval_ms must be at least 1".to_owned(),
            });
        }
        if self.hub.channel_capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "hub.channel_capacity must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Board dimensions, fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    /// Number of columns.
    #[serde(default = "default_grid_dimension")]
    pub width: i32,

    /// Number of rows.
    #[serde(default = "default_grid_dimension")]
    pub height: i32,
}

impl GridConfig {
    /// The validated grid size.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] for non-positive dimensions.
    pub const fn size(&self) -> Result<GridSize, GridError> {
        GridSize::new(self.width, self.height)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: default_grid_dimension(),
            height: default_grid_dimension(),
        }
    }
}

/// Driver periods. Evolution and broadcast run independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Real-time milliseconds between evolution steps.
    #[serde(default = "default_evolution_interval_ms")]
    pub evolution_interval_ms: u64,

    /// Real-time milliseconds between broadcast passes.
    #[serde(default = "default_broadcast_interval_ms")]
    pub broadcast_interval_ms: u64,

    /// Stop evolving after this generation (0 = unlimited).
    #[serde(default)]
    pub max_generations: u64,
}

impl TimingConfig {
    /// Evolution period as a [`Duration`].
    pub const fn evolution_interval(&self) -> Duration {
        Duration::from_millis(self.evolution_interval_ms)
    }

    /// Broadcast period as a [`Duration`].
    pub const fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            evolution_interval_ms: default_evolution_interval_ms(),
            broadcast_interval_ms: default_broadcast_interval_ms(),
            max_generations: 0,
        }
    }
}

/// Initial alive-set construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedingConfig {
    /// Number of catalog patterns scattered at random positions.
    #[serde(default = "default_pattern_count")]
    pub pattern_count: u32,

    /// Fixed RNG seed for a reproducible scatter. Random when absent.
    #[serde(default)]
    pub rng_seed: Option<u64>,

    /// Named patterns at explicit positions.
    #[serde(default)]
    pub placements: Vec<Placement>,

    /// Individual alive cells as `[x, y]`.
    #[serde(default)]
    pub cells: Vec<[i32; 2]>,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            pattern_count: default_pattern_count(),
            rng_seed: None,
            placements: Vec::new(),
            cells: Vec::new(),
        }
    }
}

/// A catalog pattern anchored at an explicit grid position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Placement {
    /// Catalog name, e.g. `glider`.
    pub pattern: String,
    /// Bounding-box origin x.
    pub x: i32,
    /// Bounding-box origin y.
    pub y: i32,
}

/// Subscription hub delivery settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HubConfig {
    /// Upper bound on one delivery attempt (0 = wait indefinitely).
    #[serde(default = "default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,

    /// Updates queued per subscriber before delivery blocks.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl HubConfig {
    /// The per-delivery bound, or `None` when unbounded.
    pub const fn delivery_timeout(&self) -> Option<Duration> {
        if self.delivery_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.delivery_timeout_ms))
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            delivery_timeout_ms: default_delivery_timeout_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Listener address for the HTTP / WebSocket server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    /// Apply `LIFESTREAM_HOST` / `LIFESTREAM_PORT` using `lookup` to read
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `LIFESTREAM_PORT` is not a port.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("LIFESTREAM_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("LIFESTREAM_PORT") {
            self.port = port.trim().parse().map_err(|e| ConfigError::Invalid {
                reason: format!("LIFESTREAM_PORT={port}: {e}"),
            })?;
        }
        Ok(())
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

const fn default_grid_dimension() -> i32 {
    500
}

const fn default_evolution_interval_ms() -> u64 {
    100
}

const fn default_broadcast_interval_ms() -> u64 {
    100
}

const fn default_pattern_count() -> u32 {
    200
}

const fn default_delivery_timeout_ms() -> u64 {
    250
}

const fn default_channel_capacity() -> usize {
    8
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    50051
}

fn default_log_level() -> String {
    String::from("info")
}
