//! Grid geometry for the torus board.
//!
//! All coordinates are `i32` to match the wire format. A [`Cell`] held by
//! the engine is always reduced into `[0, width) x [0, height)`; the torus
//! wraparound lives in [`GridSize::offset`]. A [`Viewport`] is a plain
//! rectangle in global coordinates and never wraps.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Errors raised when geometry does not fit the grid.
///
/// These are configuration errors: callers reject the request instead of
/// clamping it into range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// Grid dimensions must both be strictly positive.
    #[error("invalid grid dimensions {width}x{height}: both must be positive")]
    InvalidDimensions {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },

    /// A viewport must cover at least one cell.
    #[error("empty viewport {width}x{height}: both dimensions must be positive")]
    EmptyViewport {
        /// Requested viewport width.
        width: i32,
        /// Requested viewport height.
        height: i32,
    },

    /// The viewport rectangle reaches outside the grid.
    #[error("viewport {viewport} does not fit a {width}x{height} grid")]
    ViewportOutOfBounds {
        /// The rejected viewport.
        viewport: Viewport,
        /// Grid width.
        width: i32,
        /// Grid height.
        height: i32,
    },

    /// A cell coordinate lies outside the grid.
    #[error("cell ({x}, {y}) lies outside a {width}x{height} grid")]
    CellOutOfBounds {
        /// Cell x coordinate.
        x: i32,
        /// Cell y coordinate.
        y: i32,
        /// Grid width.
        width: i32,
        /// Grid height.
        height: i32,
    },
}

/// A coordinate pair on the board. Equality is value equality.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Cell {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Cell {
    /// Build a cell from its coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Fixed dimensions of the torus, set once for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridSize {
    width: i32,
    height: i32,
}

impl GridSize {
    /// Create a grid size.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] unless both dimensions are
    /// strictly positive.
    pub const fn new(width: i32, height: i32) -> Result<Self, GridError> {
        if width <= 0 || height <= 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Grid width.
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Grid height.
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Whether `cell` is already reduced into the grid's range.
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    /// Reject a cell outside the grid.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CellOutOfBounds`] if the cell is not in range.
    pub const fn check_cell(&self, cell: Cell) -> Result<Cell, GridError> {
        if self.contains(cell) {
            Ok(cell)
        } else {
            Err(GridError::CellOutOfBounds {
                x: cell.x,
                y: cell.y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Move `cell` by `(dx, dy)` with torus wraparound.
    ///
    /// Offsets may be negative. The result is always inside the grid.
    pub const fn offset(&self, cell: Cell, dx: i32, dy: i32) -> Cell {
        Cell {
            x: cell.x.wrapping_add(dx).rem_euclid(self.width),
            y: cell.y.wrapping_add(dy).rem_euclid(self.height),
        }
    }

    /// Reject a viewport that is empty or reaches outside the grid.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::EmptyViewport`] or
    /// [`GridError::ViewportOutOfBounds`].
    pub fn check_viewport(&self, viewport: Viewport) -> Result<Viewport, GridError> {
        if viewport.width <= 0 || viewport.height <= 0 {
            return Err(GridError::EmptyViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        let fits_x = viewport.origin_x >= 0
            && viewport
                .origin_x
                .checked_add(viewport.width)
                .is_some_and(|end| end <= self.width);
        let fits_y = viewport.origin_y >= 0
            && viewport
                .origin_y
                .checked_add(viewport.height)
                .is_some_and(|end| end <= self.height);
        if fits_x && fits_y {
            Ok(viewport)
        } else {
            Err(GridError::ViewportOutOfBounds {
                viewport,
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// A rectangular window into global board coordinates.
///
/// Supplied once by a subscriber and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Viewport {
    /// Global x of the top-left corner.
    pub origin_x: i32,
    /// Global y of the top-left corner.
    pub origin_y: i32,
    /// Width in cells.
    pub width: i32,
    /// Height in cells.
    pub height: i32,
}

impl Viewport {
    /// Build a viewport from its origin and extent.
    pub const fn new(origin_x: i32, origin_y: i32, width: i32, height: i32) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    /// Translate a global cell into viewport-local coordinates.
    ///
    /// Returns `None` when the cell falls outside the viewport.
    pub fn to_local(&self, cell: Cell) -> Option<Cell> {
        let dx = cell.x.checked_sub(self.origin_x)?;
        let dy = cell.y.checked_sub(self.origin_y)?;
        ((0..self.width).contains(&dx) && (0..self.height).contains(&dy))
            .then_some(Cell::new(dx, dy))
    }
}

impl core::fmt::Display for Viewport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "({}, {}) {}x{}",
            self.origin_x, self.origin_y, self.width, self.height
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grid(width: i32, height: i32) -> GridSize {
        GridSize::new(width, height).unwrap()
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        assert!(GridSize::new(0, 10).is_err());
        assert!(GridSize::new(10, -1).is_err());
        assert!(GridSize::new(1, 1).is_ok());
    }

    #[test]
    fn offset_wraps_both_edges() {
        let g = grid(10, 8);
        assert_eq!(g.offset(Cell::new(9, 7), 1, 1), Cell::new(0, 0));
        assert_eq!(g.offset(Cell::new(0, 0), -1, -1), Cell::new(9, 7));
        assert_eq!(g.offset(Cell::new(4, 4), 0, 0), Cell::new(4, 4));
    }

    #[test]
    fn viewport_must_fit_grid() {
        let g = grid(10, 10);
        assert!(g.check_viewport(Viewport::new(0, 0, 10, 10)).is_ok());
        assert!(g.check_viewport(Viewport::new(5, 5, 5, 5)).is_ok());
        assert!(matches!(
            g.check_viewport(Viewport::new(6, 0, 5, 5)),
            Err(GridError::ViewportOutOfBounds { .. })
        ));
        assert!(matches!(
            g.check_viewport(Viewport::new(-1, 0, 5, 5)),
            Err(GridError::ViewportOutOfBounds { .. })
        ));
        assert!(matches!(
            g.check_viewport(Viewport::new(0, 0, 0, 5)),
            Err(GridError::EmptyViewport { .. })
        ));
        assert!(g
            .check_viewport(Viewport::new(i32::MAX, 0, i32::MAX, 1))
            .is_err());
    }

    #[test]
    fn to_local_translates_and_clips() {
        let vp = Viewport::new(5, 5, 5, 5);
        assert_eq!(vp.to_local(Cell::new(7, 7)), Some(Cell::new(2, 2)));
        assert_eq!(vp.to_local(Cell::new(5, 9)), Some(Cell::new(0, 4)));
        assert_eq!(vp.to_local(Cell::new(10, 7)), None);
        assert_eq!(vp.to_local(Cell::new(4, 7)), None);
    }

    #[test]
    fn check_cell_rejects_out_of_range() {
        let g = grid(4, 4);
        assert!(g.check_cell(Cell::new(3, 3)).is_ok());
        assert!(g.check_cell(Cell::new(4, 0)).is_err());
        assert!(g.check_cell(Cell::new(0, -1)).is_err());
    }
}
