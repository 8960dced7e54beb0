//! Automaton engine: B3/S23 on a torus.
//!
//! A [`Generation`] is an immutable snapshot (counter + alive set). The
//! [`Automaton`] turns one generation into the next with a pure step:
//!
//! 1. every alive cell adds one to the tally of each of its 8 Moore
//!    neighbours, with wraparound at the grid edges;
//! 2. a tallied cell is alive next iff its tally is 3, or it is alive now
//!    and its tally is 2. Cells never tallied stay dead.
//!
//! Cost is `O(alive * 8)` and independent of the grid area. The step is
//! total: the empty board is a fixed point.

use std::collections::{BTreeMap, BTreeSet};

use lifestream_types::{Cell, GridError, GridSize, Viewport};

/// Offsets of the Moore neighbourhood.
const MOORE_NEIGHBORHOOD: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// One discrete time-step of the board.
///
/// Never mutated after creation. Publishing a new generation replaces the
/// reference to it instead of editing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    number: u64,
    alive: BTreeSet<Cell>,
}

impl Generation {
    /// The generation counter. Starts at 0 and increases by exactly 1 per step.
    pub const fn number(&self) -> u64 {
        self.number
    }

    /// The alive cells, in global coordinates.
    pub const fn alive(&self) -> &BTreeSet<Cell> {
        &self.alive
    }

    /// Number of alive cells.
    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    /// Whether `cell` is alive in this generation.
    pub fn is_alive(&self, cell: Cell) -> bool {
        self.alive.contains(&cell)
    }

    /// Alive cells inside `viewport`, translated to viewport-local coordinates.
    pub fn project(&self, viewport: &Viewport) -> Vec<Cell> {
        self.alive
            .iter()
            .filter_map(|&cell| viewport.to_local(cell))
            .collect()
    }
}

/// The step function bound to fixed grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Automaton {
    size: GridSize,
}

impl Automaton {
    /// Create an automaton for a grid of the given size.
    pub const fn new(size: GridSize) -> Self {
        Self { size }
    }

    /// The grid dimensions.
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Build generation 0 from an initial alive set.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CellOutOfBounds`] for the first cell outside the
    /// grid. Cells are never wrapped or clamped here.
    pub fn genesis<I>(&self, cells: I) -> Result<Generation, GridError>
    where
        I: IntoIterator<Item = Cell>,
    {
        let alive = cells
            .into_iter()
            .map(|cell| self.size.check_cell(cell))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Generation { number: 0, alive })
    }

    /// Compute the next generation. Deterministic and side-effect free.
    pub fn step(&self, current: &Generation) -> Generation {
        let mut tally: BTreeMap<Cell, u8> = BTreeMap::new();
        for &cell in &current.alive {
            for (dx, dy) in MOORE_NEIGHBORHOOD {
                let count = tally.entry(self.size.offset(cell, dx, dy)).or_insert(0);
                *count = count.saturating_add(1);
            }
        }

        let alive = tally
            .into_iter()
            .filter(|&(cell, count)| count == 3 || (count == 2 && current.alive.contains(&cell)))
            .map(|(cell, _)| cell)
            .collect();

        Generation {
            number: current.number.saturating_add(1),
            alive,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn automaton(width: i32, height: i32) -> Automaton {
        Automaton::new(GridSize::new(width, height).unwrap())
    }

    fn cells(coords: &[(i32, i32)]) -> BTreeSet<Cell> {
        coords.iter().copied().map(Cell::from).collect()
    }

    fn run(automaton: &Automaton, start: &Generation, steps: usize) -> Generation {
        (0..steps).fold(start.clone(), |g, _| automaton.step(&g))
    }

    #[test]
    fn step_is_deterministic() {
        let a = automaton(16, 16);
        let g = a
            .genesis(cells(&[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2), (9, 9)]))
            .unwrap();
        assert_eq!(a.step(&g), a.step(&g));
    }

    #[test]
    fn empty_board_is_fixed_point() {
        let a = automaton(10, 10);
        let g = a.genesis(Vec::new()).unwrap();
        let next = a.step(&g);
        assert!(next.alive().is_empty());
        assert_eq!(next.number(), 1);
    }

    #[test]
    fn counter_increments_by_one() {
        let a = automaton(10, 10);
        let g = a.genesis(cells(&[(0, 1), (1, 1), (2, 1)])).unwrap();
        let g3 = run(&a, &g, 3);
        assert_eq!(g3.number(), 3);
    }

    #[test]
    fn blinker_oscillates_with_period_two() {
        let a = automaton(10, 10);
        let g0 = a.genesis(cells(&[(0, 1), (1, 1), (2, 1)])).unwrap();
        let g1 = a.step(&g0);
        assert_eq!(g1.alive(), &cells(&[(1, 0), (1, 1), (1, 2)]));
        let g2 = a.step(&g1);
        assert_eq!(g2.alive(), g0.alive());
    }

    #[test]
    fn glider_translates_by_one_diagonal_every_four_steps() {
        let a = automaton(20, 20);
        let start = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];
        let g0 = a.genesis(cells(&start)).unwrap();
        let g4 = run(&a, &g0, 4);
        let shifted: Vec<_> = start.iter().map(|&(x, y)| (x + 1, y + 1)).collect();
        assert_eq!(g4.alive(), &cells(&shifted));
    }

    #[test]
    fn opposite_edges_are_neighbours() {
        // A block split across the x edge is still a block.
        let a = automaton(10, 10);
        let block = cells(&[(9, 4), (0, 4), (9, 5), (0, 5)]);
        let g = a.genesis(block.clone()).unwrap();
        assert_eq!(a.step(&g).alive(), &block);

        // A blinker crossing the x edge flips to vertical at x = 0.
        let g = a.genesis(cells(&[(9, 4), (0, 4), (1, 4)])).unwrap();
        assert_eq!(a.step(&g).alive(), &cells(&[(0, 3), (0, 4), (0, 5)]));
    }

    #[test]
    fn corners_wrap_diagonally() {
        let a = automaton(10, 10);
        let block = cells(&[(9, 9), (0, 9), (9, 0), (0, 0)]);
        let g = a.genesis(block.clone()).unwrap();
        assert_eq!(a.step(&g).alive(), &block);
    }

    #[test]
    fn lone_cell_dies() {
        let a = automaton(10, 10);
        let g = a.genesis(cells(&[(4, 4)])).unwrap();
        assert!(a.step(&g).alive().is_empty());
    }

    #[test]
    fn genesis_rejects_out_of_range_cells() {
        let a = automaton(10, 10);
        assert!(a.genesis(cells(&[(10, 0)])).is_err());
        assert!(a.genesis(cells(&[(0, -1)])).is_err());
    }

    #[test]
    fn project_clips_and_translates() {
        let a = automaton(10, 10);
        let g = a.genesis(cells(&[(2, 2), (7, 7)])).unwrap();
        assert_eq!(g.project(&Viewport::new(0, 0, 5, 5)), vec![Cell::new(2, 2)]);
        assert_eq!(g.project(&Viewport::new(5, 5, 5, 5)), vec![Cell::new(2, 2)]);
        assert!(g.project(&Viewport::new(3, 3, 2, 2)).is_empty());
    }
}
