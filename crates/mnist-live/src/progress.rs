// Progress — human-readable snapshot of a running session
//
//   Batch (12 / 117)   Epoch (3 / 25)
//   loss 0.123   acc 95.12%   val loss 0.101   val acc 96.80%
//   samples 1.23M / 1.50M   started 2 minutes ago   remaining 5 minutes

use std::fmt;
use std::time::Duration;

use mnist_live_chart::format::si;

use crate::session::StepMetrics;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Progress {
    /// Batch within the current epoch (1-based once training started).
    pub batch: usize,
    pub batches_per_epoch: usize,
    /// Last finished epoch.
    pub epoch: usize,
    pub epochs: usize,
    pub batch_size: usize,
    /// Examples in the training split.
    pub dataset_size: usize,
    /// Global batch counter.
    pub batch_counter: u64,
    pub train: StepMetrics,
    pub validation: StepMetrics,
    /// `None` until training starts.
    pub elapsed: Option<Duration>,
    pub finished: bool,
}

impl Progress {
    pub fn samples_seen(&self) -> f64 {
        self.batch_counter as f64 * self.batch_size as f64
    }

    pub fn total_samples(&self) -> f64 {
        self.dataset_size as f64 * self.epochs as f64
    }

    /// Linear extrapolation of the elapsed time over the remaining samples.
    pub fn remaining(&self) -> Option<Duration> {
        let elapsed = self.elapsed?;
        let seen = self.samples_seen();
        if seen <= 0.0 {
            return None;
        }
        let left = (self.total_samples() - seen).max(0.0);
        Some(Duration::from_secs_f64(elapsed.as_secs_f64() / seen * left))
    }

    fn remaining_text(&self) -> String {
        match (self.elapsed, self.finished) {
            (None, _) => "no idea".to_string(),
            (Some(_), true) => "finished".to_string(),
            (Some(_), false) => self
                .remaining()
                .map(humanize)
                .unwrap_or_else(|| "no idea".to_string()),
        }
    }

    fn started_text(&self) -> String {
        match self.elapsed {
            None => "not yet".to_string(),
            Some(elapsed) => format!("{} ago", humanize(elapsed)),
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Batch ({} / {})   Epoch ({} / {})",
            self.batch, self.batches_per_epoch, self.epoch, self.epochs
        )?;
        writeln!(
            f,
            "loss {:.3}   acc {:.2}%   val loss {:.3}   val acc {:.2}%",
            self.train.loss,
            self.train.accuracy * 100.0,
            self.validation.loss,
            self.validation.accuracy * 100.0
        )?;
        write!(
            f,
            "samples {} / {}   started {}   remaining {}",
            si(self.samples_seen(), 3),
            si(self.total_samples(), 3),
            self.started_text(),
            self.remaining_text()
        )
    }
}

/// Coarse relative duration: "a few seconds", "3 minutes", "an hour", "2 days".
pub fn humanize(d: Duration) -> String {
    let secs = d.as_secs_f64();
    let minutes = secs / 60.0;
    let hours = minutes / 60.0;
    let days = hours / 24.0;
    if secs < 45.0 {
        "a few seconds".to_string()
    } else if secs < 90.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes", minutes.round() as u64)
    } else if minutes < 90.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{} hours", hours.round() as u64)
    } else if hours < 36.0 {
        "a day".to_string()
    } else {
        format!("{} days", days.round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> Progress {
        Progress {
            batch: 12,
            batches_per_epoch: 117,
            epoch: 2,
            epochs: 25,
            batch_size: 512,
            dataset_size: 60_000,
            batch_counter: 246,
            train: StepMetrics {
                loss: 0.12345,
                accuracy: 0.95123,
            },
            validation: StepMetrics {
                loss: 0.1,
                accuracy: 0.968,
            },
            elapsed: Some(Duration::from_secs(120)),
            finished: false,
        }
    }

    #[test]
    fn test_before_start() {
        let text = Progress::default().to_string();
        assert!(text.contains("Batch (0 / 0)"));
        assert!(text.contains("started not yet"));
        assert!(text.ends_with("remaining no idea"));
    }

    #[test]
    fn test_running_snapshot() {
        let text = running().to_string();
        assert!(text.starts_with("Batch (12 / 117)   Epoch (2 / 25)\n"));
        assert!(text.contains("loss 0.123   acc 95.12%"));
        assert!(text.contains("val acc 96.80%"));
        assert!(text.contains("samples 126k / 1.50M"));
        assert!(text.contains("started 2 minutes ago"));
        assert!(text.ends_with("remaining 22 minutes"));
    }

    #[test]
    fn test_finished() {
        let mut p = running();
        p.finished = true;
        assert!(p.to_string().ends_with("remaining finished"));
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize(Duration::from_secs(3)), "a few seconds");
        assert_eq!(humanize(Duration::from_secs(60)), "a minute");
        assert_eq!(humanize(Duration::from_secs(600)), "10 minutes");
        assert_eq!(humanize(Duration::from_secs(3600)), "an hour");
        assert_eq!(humanize(Duration::from_secs(5 * 3600)), "5 hours");
        assert_eq!(humanize(Duration::from_secs(24 * 3600)), "a day");
        assert_eq!(humanize(Duration::from_secs(72 * 3600)), "3 days");
    }
}
