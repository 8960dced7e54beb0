//! Startup seeding: the pattern catalog and the initial alive set.
//!
//! Seeding runs once before the evolution driver starts. Patterns are
//! placed so their bounding box lies fully inside the grid; nothing is
//! wrapped or clamped at seed time. A placement that does not fit is an
//! error, never silently moved.

use std::collections::BTreeSet;

use lifestream_types::{Cell, GridError, GridSize, PatternInfo};
use rand::Rng;
use tracing::debug;

use crate::config::{Placement, SeedingConfig};

/// Errors that can occur while building the initial alive set.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// No catalog pattern has this name.
    #[error("unknown pattern: {0}")]
    UnknownPattern(String),

    /// The pattern's bounding box is larger than the grid.
    #[error("pattern {name} ({pattern_width}x{pattern_height}) does not fit a {width}x{height} grid")]
    PatternTooLarge {
        /// Pattern name.
        name: &'static str,
        /// Pattern bounding-box width.
        pattern_width: i32,
        /// Pattern bounding-box height.
        pattern_height: i32,
        /// Grid width.
        width: i32,
        /// Grid height.
        height: i32,
    },

    /// Random scatter was requested but no catalog pattern fits the grid.
    #[error("no catalog pattern fits a {width}x{height} grid")]
    NoPatternFits {
        /// Grid width.
        width: i32,
        /// Grid height.
        height: i32,
    },

    /// An explicit placement or cell lies outside the grid.
    #[error("seed outside the grid: {source}")]
    Grid {
        /// The underlying geometry error.
        #[from]
        source: GridError,
    },
}

/// A named still life, oscillator, spaceship, or methuselah.
///
/// Offsets are `(x, y)` relative to the top-left of the bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    /// Catalog name (kebab-case).
    pub name: &'static str,
    /// Cell offsets.
    pub cells: &'static [(i32, i32)],
}

impl Pattern {
    /// Bounding-box width.
    pub fn width(&self) -> i32 {
        self.cells
            .iter()
            .map(|&(x, _)| x.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    /// Bounding-box height.
    pub fn height(&self) -> i32 {
        self.cells
            .iter()
            .map(|&(_, y)| y.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    /// Whether the bounding box fits inside `size`.
    pub fn fits(&self, size: GridSize) -> bool {
        self.width() <= size.width() && self.height() <= size.height()
    }

    /// Catalog entry as served over the API.
    pub fn info(&self) -> PatternInfo {
        PatternInfo {
            name: self.name.to_owned(),
            width: self.width(),
            height: self.height(),
            cells: self.cells.iter().copied().map(Cell::from).collect(),
        }
    }

    /// The pattern's cells with its bounding box anchored at `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::PatternTooLarge`] if the pattern is bigger than
    /// the grid, or [`SeedError::Grid`] if the anchored box reaches outside.
    pub fn place(&self, size: GridSize, origin: Cell) -> Result<Vec<Cell>, SeedError> {
        if !self.fits(size) {
            return Err(SeedError::PatternTooLarge {
                name: self.name,
                pattern_width: self.width(),
                pattern_height: self.height(),
                width: size.width(),
                height: size.height(),
            });
        }
        self.cells
            .iter()
            .map(|&(dx, dy)| {
                let cell = Cell::new(origin.x.saturating_add(dx), origin.y.saturating_add(dy));
                size.check_cell(cell).map_err(SeedError::from)
            })
            .collect()
    }
}

/// The fixed catalog of seed shapes.
pub const CATALOG: &[Pattern] = &[
    Pattern {
        name: "block",
        cells: &[(0, 0), (1, 0), (0, 1), (1, 1)],
    },
    Pattern {
        name: "beehive",
        cells: &[(1, 0), (2, 0), (0, 1), (3, 1), (1, 2), (2, 2)],
    },
    Pattern {
        name: "blinker",
        cells: &[(0, 0), (1, 0), (2, 0)],
    },
    Pattern {
        name: "toad",
        cells: &[(1, 0), (2, 0), (3, 0), (0, 1), (1, 1), (2, 1)],
    },
    Pattern {
        name: "beacon",
        cells: &[(0, 0), (1, 0), (0, 1), (1, 1), (2, 2), (3, 2), (2, 3), (3, 3)],
    },
    Pattern {
        name: "glider",
        cells: &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)],
    },
    Pattern {
        name: "lightweight-spaceship",
        cells: &[
            (1, 0), (4, 0), (0, 1), (0, 2), (4, 2), (0, 3), (1, 3), (2, 3), (3, 3),
        ],
    },
    Pattern {
        name: "r-pentomino",
        cells: &[(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)],
    },
    Pattern {
        name: "diehard",
        cells: &[(6, 0), (0, 1), (1, 1), (1, 2), (5, 2), (6, 2), (7, 2)],
    },
    Pattern {
        name: "acorn",
        cells: &[(1, 0), (3, 1), (0, 2), (1, 2), (4, 2), (5, 2), (6, 2)],
    },
    Pattern {
        name: "pulsar",
        cells: &[
            (2, 0), (3, 0), (4, 0), (8, 0), (9, 0), (10, 0), (0, 2), (5, 2),
            (7, 2), (12, 2), (0, 3), (5, 3), (7, 3), (12, 3), (0, 4), (5, 4),
            (7, 4), (12, 4), (2, 5), (3, 5), (4, 5), (8, 5), (9, 5), (10, 5),
            (2, 7), (3, 7), (4, 7), (8, 7), (9, 7), (10, 7), (0, 8), (5, 8),
            (7, 8), (12, 8), (0, 9), (5, 9), (7, 9), (12, 9), (0, 10), (5, 10),
            (7, 10), (12, 10), (2, 12), (3, 12), (4, 12), (8, 12), (9, 12), (10, 12),
        ],
    },
    Pattern {
        name: "gosper-glider-gun",
        cells: &[
            (24, 0), (22, 1), (24, 1), (12, 2), (13, 2), (20, 2), (21, 2), (34, 2),
            (35, 2), (11, 3), (15, 3), (20, 3), (21, 3), (34, 3), (35, 3), (0, 4),
            (1, 4), (10, 4), (16, 4), (20, 4), (21, 4), (0, 5), (1, 5), (10, 5),
            (14, 5), (16, 5), (17, 5), (22, 5), (24, 5), (10, 6), (16, 6), (24, 6),
            (11, 7), (15, 7), (12, 8), (13, 8),
        ],
    },
];

/// Look up a catalog pattern. Case-insensitive; `_` and ` ` match `-`.
pub fn find_pattern(name: &str) -> Option<&'static Pattern> {
    let wanted: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '_' | ' ' => '-',
            other => other.to_ascii_lowercase(),
        })
        .collect();
    CATALOG.iter().find(|pattern| pattern.name == wanted)
}

/// Scatter `count` randomly chosen catalog patterns at random positions.
///
/// Only patterns that fit the grid are candidates. Overlapping placements
/// simply merge.
///
/// # Errors
///
/// Returns [`SeedError::NoPatternFits`] if `count > 0` and no catalog
/// pattern fits the grid.
pub fn scatter<R: Rng + ?Sized>(
    size: GridSize,
    count: u32,
    rng: &mut R,
) -> Result<BTreeSet<Cell>, SeedError> {
    let mut alive = BTreeSet::new();
    if count == 0 {
        return Ok(alive);
    }

    let candidates: Vec<&Pattern> = CATALOG.iter().filter(|p| p.fits(size)).collect();
    if candidates.is_empty() {
        return Err(SeedError::NoPatternFits {
            width: size.width(),
            height: size.height(),
        });
    }

    for _ in 0..count {
        let Some(pattern) = candidates.get(rng.random_range(0..candidates.len())) else {
            continue;
        };
        // fits() guarantees both spans are >= 0.
        let span_x = size.width().saturating_sub(pattern.width());
        let span_y = size.height().saturating_sub(pattern.height());
        let origin = Cell::new(rng.random_range(0..=span_x), rng.random_range(0..=span_y));
        debug!(pattern = pattern.name, x = origin.x, y = origin.y, "Scattering pattern");
        alive.extend(pattern.place(size, origin)?);
    }
    Ok(alive)
}

/// Place one configured pattern.
///
/// # Errors
///
/// Returns [`SeedError::UnknownPattern`] for an unknown name, otherwise any
/// error from [`Pattern::place`].
pub fn place_named(size: GridSize, placement: &Placement) -> Result<Vec<Cell>, SeedError> {
    let pattern = find_pattern(&placement.pattern)
        .ok_or_else(|| SeedError::UnknownPattern(placement.pattern.clone()))?;
    pattern.place(size, Cell::new(placement.x, placement.y))
}

/// Build the generation-0 alive set from the seeding configuration:
/// explicit placements, explicit cells, then `pattern_count` random patterns.
///
/// # Errors
///
/// Returns the first [`SeedError`] encountered.
pub fn initial_cells<R: Rng + ?Sized>(
    size: GridSize,
    config: &SeedingConfig,
    rng: &mut R,
) -> Result<BTreeSet<Cell>, SeedError> {
    let mut alive = BTreeSet::new();
    for placement in &config.placements {
        alive.extend(place_named(size, placement)?);
    }
    for &[x, y] in &config.cells {
        alive.insert(size.check_cell(Cell::new(x, y))?);
    }
    alive.extend(scatter(size, config.pattern_count, rng)?);
    Ok(alive)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn grid(width: i32, height: i32) -> GridSize {
        GridSize::new(width, height).unwrap()
    }

    #[test]
    fn catalog_offsets_are_normalised() {
        for pattern in CATALOG {
            assert!(!pattern.cells.is_empty(), "{} is empty", pattern.name);
            assert!(pattern.cells.iter().all(|&(x, y)| x >= 0 && y >= 0));
            assert_eq!(pattern.cells.iter().map(|&(x, _)| x).min(), Some(0));
            assert_eq!(pattern.cells.iter().map(|&(_, y)| y).min(), Some(0));
        }
    }

    #[test]
    fn bounding_boxes() {
        let gun = find_pattern("gosper-glider-gun").unwrap();
        assert_eq!((gun.width(), gun.height()), (36, 9));
        assert_eq!(gun.cells.len(), 36);
        let pulsar = find_pattern("Pulsar").unwrap();
        assert_eq!((pulsar.width(), pulsar.height()), (13, 13));
        assert_eq!(pulsar.cells.len(), 48);
    }

    #[test]
    fn lookup_normalises_names() {
        assert!(find_pattern("R_Pentomino").is_some());
        assert!(find_pattern("lightweight spaceship").is_some());
        assert!(find_pattern("spaceship-two").is_none());
    }

    #[test]
    fn place_rejects_instead_of_clamping() {
        let size = grid(10, 10);
        let glider = find_pattern("glider").unwrap();
        assert!(glider.place(size, Cell::new(7, 7)).is_ok());
        assert!(matches!(
            glider.place(size, Cell::new(8, 7)),
            Err(SeedError::Grid { .. })
        ));

        let gun = find_pattern("gosper-glider-gun").unwrap();
        assert!(matches!(
            gun.place(size, Cell::new(0, 0)),
            Err(SeedError::PatternTooLarge { .. })
        ));
    }

    #[test]
    fn scatter_stays_inside_grid() {
        let size = grid(40, 30);
        let mut rng = StdRng::seed_from_u64(42);
        let alive = scatter(size, 50, &mut rng).unwrap();
        assert!(!alive.is_empty());
        assert!(alive.iter().all(|&cell| size.contains(cell)));
    }

    #[test]
    fn scatter_is_reproducible_with_fixed_seed() {
        let size = grid(100, 100);
        let a = scatter(size, 20, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = scatter(size, 20, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn scatter_on_tiny_grid() {
        let mut rng = StdRng::seed_from_u64(1);
        // Only the blinker fits a 3x1 strip.
        let alive = scatter(grid(3, 1), 5, &mut rng).unwrap();
        assert_eq!(alive.len(), 3);
        assert!(matches!(
            scatter(grid(1, 1), 1, &mut rng),
            Err(SeedError::NoPatternFits { .. })
        ));
        assert!(scatter(grid(1, 1), 0, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn initial_cells_combines_sources() {
        let size = grid(50, 50);
        let config = SeedingConfig {
            pattern_count: 0,
            rng_seed: None,
            placements: vec![Placement {
                pattern: String::from("block"),
                x: 10,
                y: 10,
            }],
            cells: vec![[0, 0], [49, 49]],
        };
        let alive = initial_cells(size, &config, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(alive.len(), 6);
        assert!(alive.contains(&Cell::new(11, 11)));
        assert!(alive.contains(&Cell::new(49, 49)));
    }

    #[test]
    fn initial_cells_rejects_bad_entries() {
        let size = grid(20, 20);
        let mut rng = StdRng::seed_from_u64(3);

        let unknown = SeedingConfig {
            placements: vec![Placement {
                pattern: String::from("unicorn"),
                x: 0,
                y: 0,
            }],
            ..SeedingConfig::default()
        };
        assert!(matches!(
            initial_cells(size, &unknown, &mut rng),
            Err(SeedError::UnknownPattern(_))
        ));

        let outside = SeedingConfig {
            pattern_count: 0,
            cells: vec![[20, 0]],
            ..SeedingConfig::default()
        };
        assert!(matches!(
            initial_cells(size, &outside, &mut rng),
            Err(SeedError::Grid { .. })
        ));
    }
}
