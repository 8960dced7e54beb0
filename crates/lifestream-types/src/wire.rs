//! Messages exchanged with viewers.
//!
//! A viewer sends one [`SubscribeRequest`] when it connects and then only
//! receives: an unbounded sequence of [`BoardUpdate`]s until the connection
//! ends. [`StatusResponse`] and [`PatternInfo`] back the read-only REST
//! endpoints.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::grid::{Cell, Viewport};

/// The subscribe request: the viewport a viewer wants to watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SubscribeRequest {
    /// Global x of the viewport origin.
    pub x: i32,
    /// Global y of the viewport origin.
    pub y: i32,
    /// Viewport width in cells.
    pub width: i32,
    /// Viewport height in cells.
    pub height: i32,
}

impl SubscribeRequest {
    /// The requested rectangle. Not yet checked against the grid.
    pub const fn viewport(&self) -> Viewport {
        Viewport::new(self.x, self.y, self.width, self.height)
    }
}

/// One streamed update for a single subscriber.
///
/// `alive_cells` are viewport-local and unordered. `sent_timestamp_nanos`
/// is wall-clock time at the moment of send so the viewer can compute
/// one-way latency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BoardUpdate {
    /// Generation counter of the snapshot this update was cut from.
    #[ts(type = "number")]
    pub generation: u64,
    /// Alive cells inside the viewport, in viewport-local coordinates.
    pub alive_cells: Vec<Cell>,
    /// Unix epoch nanoseconds when the update was handed to the transport.
    #[ts(type = "number")]
    pub sent_timestamp_nanos: i64,
}

/// Diagnostic snapshot served by `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatusResponse {
    /// Latest published generation.
    #[ts(type = "number")]
    pub generation: u64,
    /// Number of alive cells on the whole board.
    pub alive_cells: usize,
    /// Grid width.
    pub width: i32,
    /// Grid height.
    pub height: i32,
    /// Currently registered subscribers.
    pub subscribers: usize,
}

/// A seed pattern from the catalog, served by `GET /api/patterns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PatternInfo {
    /// Catalog name.
    pub name: String,
    /// Bounding-box width.
    pub width: i32,
    /// Bounding-box height.
    pub height: i32,
    /// Cell offsets relative to the bounding-box origin.
    pub cells: Vec<Cell>,
}
