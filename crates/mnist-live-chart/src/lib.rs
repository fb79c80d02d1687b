//! # mnist-live-chart
//!
//! Bounded training-metric history and a live accuracy chart.
//!
//! - [`MetricHistory`]: trailing window of batch accuracies plus every epoch's
//!   validation accuracy
//! - [`ChartLayout`] / [`ChartFrame`]: margins, power-law accuracy axis,
//!   linear batch and epoch axes, SVG output and tooltip hit-testing
//! - [`TrainingChart`]: cloneable handle that redraws on every push
//! - [`spawn_resize_watch`]: re-lays the chart out when its surface changes size
//!
//! ```
//! use mnist_live_chart::{BatchPoint, TrainingChart};
//!
//! let chart = TrainingChart::new();
//! for batch in 1..=4 {
//!     chart.push_batch_point(BatchPoint { batch, accuracy: 0.9 }, 2);
//! }
//! assert_eq!(chart.batch_points().len(), 3);
//! let svg = chart.render_at(640.0, 320.0).to_svg();
//! assert!(svg.contains("batch-line"));
//! ```

pub mod chart;
pub mod format;
pub mod frame;
pub mod layout;
pub mod resize;
pub mod scale;
pub mod series;

pub use chart::{ChartSurface, SvgFileSurface, TrainingChart};
pub use frame::{ChartFrame, Dot, Tick, Tooltip, DOT_RADIUS};
pub use layout::{ChartLayout, MARGIN_BOTTOM, MARGIN_LEFT, MARGIN_RIGHT, MARGIN_TOP};
pub use resize::{spawn_resize_watch, RESIZE_POLL_INTERVAL};
pub use scale::{LinearScale, PowScale};
pub use series::{BatchPoint, EpochPoint, MetricHistory};
