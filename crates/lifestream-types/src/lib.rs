//! Shared type definitions for the Lifestream torus automaton.
//!
//! This crate is the single source of truth for the value types that cross
//! crate boundaries and the wire. Wire types flow downstream to `TypeScript`
//! via `ts-rs` for the rendering client.
//!
//! # Modules
//!
//! - [`grid`] -- Grid geometry: [`Cell`], [`GridSize`], [`Viewport`] and the
//!   [`GridError`] raised when a viewport does not fit the grid
//! - [`ids`] -- Opaque subscriber handles
//! - [`wire`] -- Subscribe requests, streamed board updates, and status
//!   payloads exchanged with viewers

pub mod grid;
pub mod ids;
pub mod wire;

// Re-export all public types at crate root for convenience.
pub use grid::{Cell, GridError, GridSize, Viewport};
pub use ids::SubscriberId;
pub use wire::{BoardUpdate, PatternInfo, StatusResponse, SubscribeRequest};
