//! REST endpoint handlers.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/status` | Generation, population, grid size, subscribers |
//! | `GET` | `/api/patterns` | The seeding pattern catalog |
//! | `GET` | `/api/patterns/{name}` | One catalog pattern |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use lifestream_core::seed::find_pattern;
use lifestream_core::CATALOG;
use lifestream_types::{PatternInfo, StatusResponse};

use crate::error::ApiError;
use crate::state::AppState;

/// Current generation, population, grid dimensions, and subscriber count.
///
/// # Route
///
/// `GET /api/status`
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(state.status())
}

/// Every catalog pattern, normalised to its bounding box.
///
/// # Route
///
/// `GET /api/patterns`
pub async fn list_patterns() -> Json<Vec<PatternInfo>> {
    Json(CATALOG.iter().map(lifestream_core::Pattern::info).collect())
}

/// A single catalog pattern by name.
///
/// # Route
///
/// `GET /api/patterns/{name}`
pub async fn get_pattern(Path(name): Path<String>) -> Result<Json<PatternInfo>, ApiError> {
    find_pattern(&name)
        .map(|pattern| Json(pattern.info()))
        .ok_or_else(|| ApiError::NotFound(format!("pattern {name}")))
}
