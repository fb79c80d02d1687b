// Metric history — a bounded batch series and an append-only epoch series
//
// The batch series is a trailing window: after each push it holds at most
// `keep + 1` points, oldest dropped first. The epoch series only grows; it
// holds one point per finished epoch, so it stays small.

use std::collections::VecDeque;

use crate::scale::extent;

/// Training accuracy after one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchPoint {
    /// Global batch counter across all epochs.
    pub batch: u64,
    pub accuracy: f64,
}

/// Validation accuracy at the end of an epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochPoint {
    /// Global batch counter when the epoch ended.
    pub batch: u64,
    pub accuracy: f64,
    /// 1-based epoch index.
    pub epoch: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MetricHistory {
    batches: VecDeque<BatchPoint>,
    epochs: Vec<EpochPoint>,
}

impl MetricHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// History whose batch series starts at `{batch 0, accuracy 0}`, so the
    /// batch line is anchored at the origin.
    pub fn seeded() -> Self {
        let mut history = Self::new();
        history.batches.push_back(BatchPoint {
            batch: 0,
            accuracy: 0.0,
        });
        history
    }

    /// Append a batch point, then drop the oldest until at most `keep + 1`
    /// remain.
    pub fn push_batch(&mut self, point: BatchPoint, keep: usize) {
        self.batches.push_back(point);
        let cap = keep.saturating_add(1);
        while self.batches.len() > cap {
            self.batches.pop_front();
        }
    }

    pub fn push_epoch(&mut self, point: EpochPoint) {
        self.epochs.push(point);
    }

    /// Batch points, oldest first.
    pub fn batches(&self) -> impl ExactSizeIterator<Item = &BatchPoint> + '_ {
        self.batches.iter()
    }

    pub fn epochs(&self) -> &[EpochPoint] {
        &self.epochs
    }

    pub fn batch_len(&self) -> usize {
        self.batches.len()
    }

    pub fn epoch_len(&self) -> usize {
        self.epochs.len()
    }

    /// `(min, max)` batch index over the batch series.
    pub fn batch_extent(&self) -> Option<(f64, f64)> {
        extent(self.batches.iter().map(|p| p.batch as f64))
    }

    /// `(min, max)` epoch index over the epoch series.
    pub fn epoch_extent(&self) -> Option<(f64, f64)> {
        extent(self.epochs.iter().map(|p| p.epoch as f64))
    }
}
