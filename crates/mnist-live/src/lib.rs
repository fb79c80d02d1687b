//! # mnist-live
//!
//! Train a digit classifier on MNIST while a bounded accuracy chart follows
//! along.
//!
//! This is the top-level crate that ties the loader and the chart together.
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | `mnist-live-data` | Chunked fetch, gzip inflate, IDX parsing, shuffled one-hot batches |
//! | `mnist-live-chart` | Bounded metric history, scales, SVG frames, resize watch |
//! | `mnist-live` | Config, training session, progress readout, baseline model, CLI |
//!
//! ## Modules
//!
//! - [`config`]: `TrainerConfig` defaults, TOML loading, validation
//! - [`session`]: `TrainingSession` and the `Classifier` seam
//! - [`progress`]: progress snapshot with a human-readable `Display`
//! - [`baseline`]: softmax regression on raw pixels
//! - [`telemetry`]: tracing subscriber setup

/// Re-export the data pipeline.
pub mod data {
    pub use mnist_live_data::*;
}

/// Re-export the chart.
pub mod chart {
    pub use mnist_live_chart::*;
}

pub mod baseline;
pub mod config;
pub mod progress;
pub mod session;
pub mod telemetry;

pub use baseline::SoftmaxRegression;
pub use config::{ConfigError, TrainerConfig};
pub use progress::Progress;
pub use session::{
    Classifier, EpochLog, SessionConfig, SessionError, StepMetrics, TrainSummary, TrainingSession,
};
