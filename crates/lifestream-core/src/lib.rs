//! Automaton engine, evolution driver, and startup plumbing for Lifestream.
//!
//! # Modules
//!
//! - [`engine`] -- [`Generation`] snapshots and the pure B3/S23 torus step.
//! - [`board`] -- Single-writer / multi-reader handle on the current
//!   generation.
//! - [`evolution`] -- [`EvolutionDriver`], the periodic task that steps and
//!   publishes.
//! - [`signal`] -- [`StopSignal`], used for driver shutdown and connection
//!   cancellation.
//! - [`seed`] -- Pattern catalog and generation-0 construction.
//! - [`config`] -- Configuration loading from `lifestream-config.yaml` into
//!   strongly-typed structs.
//!
//! [`Generation`]: engine::Generation
//! [`EvolutionDriver`]: evolution::EvolutionDriver
//! [`StopSignal`]: signal::StopSignal

pub mod board;
pub mod config;
pub mod engine;
pub mod evolution;
pub mod seed;
pub mod signal;

pub use board::{BoardReader, BoardWriter};
pub use config::{ConfigError, LifestreamConfig};
pub use engine::{Automaton, Generation};
pub use evolution::{EvolutionDriver, EvolutionEnd, EvolutionReport};
pub use seed::{CATALOG, Pattern, SeedError};
pub use signal::StopSignal;
