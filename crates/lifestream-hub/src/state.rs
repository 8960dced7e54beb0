//! Shared application state for the HTTP server.

use std::sync::Arc;

use lifestream_core::BoardReader;
use lifestream_types::{GridSize, StatusResponse};

use crate::hub::SubscriptionHub;

/// State shared by every route.
///
/// Handlers only ever read the board; the evolution driver owns the single
/// write handle.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The subscriber registry.
    pub hub: Arc<SubscriptionHub>,
    /// Read handle on the current generation.
    pub board: BoardReader,
}

impl AppState {
    /// Bundle the hub and a board reader.
    pub const fn new(hub: Arc<SubscriptionHub>, board: BoardReader) -> Self {
        Self { hub, board }
    }

    /// The grid every viewport is validated against.
    pub fn grid_size(&self) -> GridSize {
        self.hub.grid_size()
    }

    /// Snapshot of the server status.
    pub fn status(&self) -> StatusResponse {
        let current = self.board.current();
        let size = self.grid_size();
        StatusResponse {
            generation: current.number(),
            alive_cells: current.alive_count(),
            width: size.width(),
            height: size.height(),
            subscribers: self.hub.len(),
        }
    }
}
