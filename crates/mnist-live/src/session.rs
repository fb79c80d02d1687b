// TrainingSession — drive a classifier from two batch sources into the chart
//
//   1. Draw one validation batch from the test split (kept for the run)
//   2. For each epoch:
//      a. Pull training batches until one reports `done` (trained on too)
//      b. Push each batch's accuracy into the chart's trailing window
//      c. Evaluate the validation batch, push an epoch point
//      d. Log the epoch
//
// The session yields to the scheduler after every batch so chart tasks
// (resize polling) keep running on a single-threaded runtime. Every batch
// and epoch publishes a fresh `Progress` on the `subscribe` channel, and
// the snapshot is logged at each epoch end.

use std::fmt;
use std::time::Instant;

use ndarray::{Array2, Array4};
use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, info};

use mnist_live_chart::{BatchPoint, EpochPoint, TrainingChart};
use mnist_live_data::{Batch, BatchSource, PreconditionError};

use crate::progress::Progress;

/// Loss and accuracy of one step or one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepMetrics {
    pub loss: f64,
    pub accuracy: f64,
}

/// A model the session can train one batch at a time.
pub trait Classifier {
    /// One optimisation step. Returns the metrics of the forward pass.
    fn train_batch(&mut self, batch: &Batch) -> StepMetrics;

    /// Metrics on held-out data, without updating the model.
    fn evaluate(&self, xs: &Array4<f32>, ys: &Array2<f32>) -> StepMetrics;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("training split: {0}")]
    Train(PreconditionError),
    #[error("test split: {0}")]
    Test(PreconditionError),
}

/// Log for a single training epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochLog {
    /// Epoch number (1-based).
    pub epoch: usize,
    /// Batches trained in this epoch.
    pub batches: usize,
    /// Mean training loss over the epoch.
    pub loss: f64,
    /// Mean training accuracy over the epoch.
    pub accuracy: f64,
    pub val_loss: f64,
    pub val_accuracy: f64,
}

/// Summary of a full training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainSummary {
    pub epochs: Vec<EpochLog>,
    /// Global batch count.
    pub batches: u64,
    pub batches_per_epoch: usize,
}

impl TrainSummary {
    pub fn final_val_accuracy(&self) -> Option<f64> {
        self.epochs.last().map(|e| e.val_accuracy)
    }
}

impl fmt::Display for TrainSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Training complete: {} epochs, {} batches",
            self.epochs.len(),
            self.batches
        )?;
        for log in &self.epochs {
            writeln!(
                f,
                "  epoch {}: loss = {:.4}, acc = {:.2}%, val_loss = {:.4}, val_acc = {:.2}%",
                log.epoch,
                log.loss,
                log.accuracy * 100.0,
                log.val_loss,
                log.val_accuracy * 100.0
            )?;
        }
        match self.final_val_accuracy() {
            Some(acc) => write!(f, "  final validation accuracy: {:.2}%", acc * 100.0),
            None => write!(f, "  no epochs run"),
        }
    }
}

/// Batch, validation and epoch settings for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub batch_size: usize,
    pub validation_batch_size: usize,
    pub epochs: usize,
}

impl From<&crate::config::TrainerConfig> for SessionConfig {
    fn from(c: &crate::config::TrainerConfig) -> Self {
        Self {
            batch_size: c.batch_size,
            validation_batch_size: c.validation_batch_size,
            epochs: c.epochs,
        }
    }
}

pub struct TrainingSession {
    config: SessionConfig,
    chart: TrainingChart,
    progress: Progress,
    updates: watch::Sender<Progress>,
}

impl TrainingSession {
    pub fn new(config: SessionConfig, chart: TrainingChart) -> Self {
        let (updates, _) = watch::channel(Progress::default());
        Self {
            config,
            chart,
            progress: Progress::default(),
            updates,
        }
    }

    /// Receive every progress snapshot published while `run` is going.
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.updates.subscribe()
    }

    fn publish(&self) {
        self.updates.send_replace(self.progress.clone());
    }

    pub fn chart(&self) -> &TrainingChart {
        &self.chart
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Train `model` for the configured number of epochs.
    ///
    /// Both sources must already be loaded.
    pub async fn run<R1, R2, M>(
        &mut self,
        train: &mut BatchSource<R1>,
        test: &mut BatchSource<R2>,
        model: &mut M,
    ) -> Result<TrainSummary, SessionError>
    where
        R1: Rng,
        R2: Rng,
        M: Classifier,
    {
        let SessionConfig {
            batch_size,
            validation_batch_size,
            epochs,
        } = self.config;
        let dataset_size = train.number_of_images();
        let batches_per_epoch = dataset_size / batch_size.max(1);

        let validation = test
            .try_next_batch(validation_batch_size)
            .map_err(SessionError::Test)?;

        let started = Instant::now();
        self.progress = Progress {
            batches_per_epoch,
            epochs,
            batch_size,
            dataset_size,
            elapsed: Some(started.elapsed()),
            ..Progress::default()
        };
        self.publish();
        info!(
            dataset_size,
            batch_size,
            batches_per_epoch,
            epochs,
            validation = validation.len(),
            "training started"
        );

        let mut counter: u64 = 0;
        let mut logs = Vec::with_capacity(epochs);

        for epoch in 1..=epochs {
            let mut batches = 0usize;
            let mut loss_sum = 0.0;
            let mut acc_sum = 0.0;

            loop {
                let batch = train.try_next_batch(batch_size).map_err(SessionError::Train)?;
                let metrics = model.train_batch(&batch);
                let done = batch.done;
                drop(batch);

                batches += 1;
                counter += 1;
                loss_sum += metrics.loss;
                acc_sum += metrics.accuracy;

                self.chart.push_batch_point(
                    BatchPoint {
                        batch: counter,
                        accuracy: metrics.accuracy,
                    },
                    batches_per_epoch,
                );
                self.progress.batch = batches;
                self.progress.batch_counter = counter;
                self.progress.train = metrics;
                self.progress.elapsed = Some(started.elapsed());
                self.publish();
                debug!(
                    epoch,
                    batch = batches,
                    loss = metrics.loss,
                    accuracy = metrics.accuracy,
                    "batch trained"
                );

                tokio::task::yield_now().await;
                if done {
                    break;
                }
            }

            let val = model.evaluate(&validation.xs, &validation.ys);
            self.chart.push_epoch_point(EpochPoint {
                batch: counter,
                accuracy: val.accuracy,
                epoch: epoch as u64,
            });
            self.progress.epoch = epoch;
            self.progress.validation = val;
            self.progress.elapsed = Some(started.elapsed());
            self.publish();
            info!("{}", self.progress);

            let log = EpochLog {
                epoch,
                batches,
                loss: loss_sum / batches as f64,
                accuracy: acc_sum / batches as f64,
                val_loss: val.loss,
                val_accuracy: val.accuracy,
            };
            info!(
                epoch,
                batches,
                loss = log.loss,
                accuracy = log.accuracy,
                val_loss = log.val_loss,
                val_accuracy = log.val_accuracy,
                "epoch finished"
            );
            logs.push(log);
        }

        self.progress.finished = true;
        self.publish();
        info!(batches = counter, elapsed = ?started.elapsed(), "training finished");

        Ok(TrainSummary {
            epochs: logs,
            batches: counter,
            batches_per_epoch,
        })
    }
}
