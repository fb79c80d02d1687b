// EpochCursor — position within a shuffled pass over the dataset
//
// Two states, no terminal one:
//
//   FILLING  the cursor has not reached the end of the permutation
//   WRAPPED  this call's batch reached or crossed the end
//
// WRAPPED reshuffles the permutation in place at the moment of the wrap and
// drops straight back to FILLING. A batch that crosses the boundary takes its
// remaining rows from the front of the *new* permutation, and the cursor
// carries on from there, so no example is seen twice within an epoch and
// every batch is full.

use rand::Rng;
use tracing::debug;

/// Indices picked for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Dataset indices in batch order.
    pub indices: Vec<usize>,
    /// True when the batch reached or crossed the end of the permutation.
    pub wrapped: bool,
}

/// Cursor over a fixed-size index permutation.
///
/// The random source is passed in on every call that may shuffle, so the
/// owner decides which generator drives the order.
#[derive(Debug, Clone)]
pub struct EpochCursor {
    indices: Vec<usize>,
    cursor: usize,
    epochs: u64,
}

impl EpochCursor {
    /// Identity permutation over `[0, len)`.
    pub fn new(len: usize) -> Self {
        Self {
            indices: (0..len).collect(),
            cursor: 0,
            epochs: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Current position in `[0, len)`.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Number of completed passes.
    pub fn epochs(&self) -> u64 {
        self.epochs
    }

    /// The current permutation.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Take the next `size` indices, reshuffling whenever the end is reached.
    ///
    /// # Panics
    /// Panics if the permutation is empty.
    pub fn advance<R: Rng + ?Sized>(&mut self, size: usize, rng: &mut R) -> Selection {
        assert!(!self.indices.is_empty(), "cannot advance over an empty permutation");

        let len = self.indices.len();
        let mut picked = Vec::with_capacity(size);
        let mut wrapped = false;

        for _ in 0..size {
            picked.push(self.indices[self.cursor]);
            self.cursor += 1;
            if self.cursor == len {
                self.cursor = 0;
                self.epochs += 1;
                self.shuffle(&mut *rng);
                wrapped = true;
            }
        }

        Selection {
            indices: picked,
            wrapped,
        }
    }

    /// In-place Fisher–Yates: for each `i` pick `j` uniformly in `[i, len)`
    /// and swap.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let len = self.indices.len();
        for i in 0..len.saturating_sub(1) {
            let j = rng.gen_range(i..len);
            self.indices.swap(i, j);
        }
        debug!(len, epochs = self.epochs, "reshuffled index permutation");
    }
}
