//! Shared work queue for fetch workers.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::tile::TileDescriptor;

/// Queue of tiles still to fetch.
///
/// Seeded once before any worker starts and only drained afterwards, so an
/// empty pop means the run has no more work and the caller should exit.
/// `pop` is atomic: two workers never receive the same descriptor.
#[derive(Debug, Default)]
pub struct WorkQueue {
    tiles: Mutex<VecDeque<TileDescriptor>>,
}

impl WorkQueue {
    /// Creates a queue holding `tiles` in order.
    pub fn new(tiles: impl IntoIterator<Item = TileDescriptor>) -> Self {
        Self {
            tiles: Mutex::new(tiles.into_iter().collect()),
        }
    }

    /// Takes the next tile, or `None` once the queue is exhausted.
    pub fn pop(&self) -> Option<TileDescriptor> {
        self.tiles.lock().pop_front()
    }

    /// Number of tiles not yet handed out.
    pub fn len(&self) -> usize {
        self.tiles.lock().len()
    }

    /// Returns true once every tile has been handed out.
    pub fn is_empty(&self) -> bool {
        self.tiles.lock().is_empty()
    }
}
