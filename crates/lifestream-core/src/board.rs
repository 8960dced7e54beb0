//! The published "current generation" reference.
//!
//! [`channel`] splits the board into a single [`BoardWriter`] (owned by the
//! evolution driver) and any number of [`BoardReader`]s. Publishing swaps an
//! [`Arc`] to a finished [`Generation`] under a short-held lock, so readers
//! always see a complete snapshot and never hold the lock while they work
//! on it.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::engine::Generation;

type Slot = Arc<RwLock<Arc<Generation>>>;

/// Create a board holding `initial` and return its writer and a reader.
pub fn channel(initial: Generation) -> (BoardWriter, BoardReader) {
    let slot: Slot = Arc::new(RwLock::new(Arc::new(initial)));
    (
        BoardWriter {
            slot: Arc::clone(&slot),
        },
        BoardReader { slot },
    )
}

/// The sole writer of the current generation. Deliberately not `Clone`.
#[derive(Debug)]
pub struct BoardWriter {
    slot: Slot,
}

impl BoardWriter {
    /// The currently published generation.
    pub fn current(&self) -> Arc<Generation> {
        Arc::clone(&self.slot.read())
    }

    /// Replace the published generation and return the new reference.
    pub fn publish(&mut self, next: Generation) -> Arc<Generation> {
        let next = Arc::new(next);
        *self.slot.write() = Arc::clone(&next);
        next
    }

    /// Another reader for the same board.
    pub fn reader(&self) -> BoardReader {
        BoardReader {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// Read-only handle to the current generation.
#[derive(Debug, Clone)]
pub struct BoardReader {
    slot: Slot,
}

impl BoardReader {
    /// The currently published generation.
    pub fn current(&self) -> Arc<Generation> {
        Arc::clone(&self.slot.read())
    }

    /// Counter of the currently published generation.
    pub fn generation_number(&self) -> u64 {
        self.slot.read().number()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lifestream_types::{Cell, GridSize};

    use super::*;
    use crate::engine::Automaton;

    #[test]
    fn readers_see_published_generation() {
        let automaton = Automaton::new(GridSize::new(10, 10).unwrap());
        let g0 = automaton
            .genesis([Cell::new(0, 1), Cell::new(1, 1), Cell::new(2, 1)])
            .unwrap();
        let (mut writer, reader) = channel(g0);
        let second = writer.reader();

        let before = reader.current();
        let next = automaton.step(&writer.current());
        writer.publish(next);

        // A snapshot taken before the swap is unaffected by it.
        assert_eq!(before.number(), 0);
        assert!(before.is_alive(Cell::new(0, 1)));

        assert_eq!(reader.generation_number(), 1);
        assert_eq!(second.current().number(), 1);
        assert!(reader.current().is_alive(Cell::new(1, 0)));
    }
}
