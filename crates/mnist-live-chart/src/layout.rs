// ChartLayout — fixed geometry for one surface size
//
// The layout is rebuilt only when the surface size changes. It owns the
// vertical accuracy scale, which is the same for both series. The horizontal
// scales depend on the data and are recomputed on every render.

use crate::format::{accuracy_tick, tick_label};
use crate::frame::{ChartFrame, Dot, Tick};
use crate::scale::{LinearScale, PowScale, DEFAULT_TICK_COUNT};
use crate::series::MetricHistory;

pub const MARGIN_LEFT: f64 = 45.0;
pub const MARGIN_RIGHT: f64 = 15.0;
pub const MARGIN_TOP: f64 = 15.0;
pub const MARGIN_BOTTOM: f64 = 30.0;

/// Exponent of the accuracy axis.
pub const ACCURACY_EXPONENT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    width: f64,
    height: f64,
    chart_width: f64,
    chart_height: f64,
    y: PowScale,
}

impl ChartLayout {
    /// Layout for a surface of `width × height` pixels. Sizes smaller than
    /// the margins (or non-finite) are raised to the margins alone.
    pub fn new(width: f64, height: f64) -> Self {
        let width = clamp_size(width, MARGIN_LEFT + MARGIN_RIGHT);
        let height = clamp_size(height, MARGIN_TOP + MARGIN_BOTTOM);
        let chart_width = width - MARGIN_LEFT - MARGIN_RIGHT;
        let chart_height = height - MARGIN_TOP - MARGIN_BOTTOM;
        Self {
            width,
            height,
            chart_width,
            chart_height,
            y: PowScale::new(ACCURACY_EXPONENT, (0.0, 1.0), (chart_height, 0.0)),
        }
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn chart_size(&self) -> (f64, f64) {
        (self.chart_width, self.chart_height)
    }

    pub fn accuracy_scale(&self) -> &PowScale {
        &self.y
    }

    /// Horizontal scale over the batch indices currently in `history`.
    pub fn batch_scale(&self, history: &MetricHistory) -> Option<LinearScale> {
        history
            .batch_extent()
            .map(|domain| LinearScale::new(domain, (0.0, self.chart_width)))
    }

    /// Horizontal scale over the epoch indices in `history`.
    pub fn epoch_scale(&self, history: &MetricHistory) -> Option<LinearScale> {
        history
            .epoch_extent()
            .map(|domain| LinearScale::new(domain, (0.0, self.chart_width)))
    }

    pub fn render(&self, history: &MetricHistory) -> ChartFrame {
        let y = |acc: f64| finite(self.y.map(acc));

        let y_ticks = self
            .y
            .ticks(DEFAULT_TICK_COUNT)
            .into_iter()
            .map(|v| Tick {
                offset: y(v),
                label: accuracy_tick(v),
            })
            .collect();

        let (x_ticks, batch_line) = match self.batch_scale(history) {
            Some(scale) => {
                let step = scale.tick_step(DEFAULT_TICK_COUNT);
                let ticks = scale
                    .ticks(DEFAULT_TICK_COUNT)
                    .into_iter()
                    .map(|v| Tick {
                        offset: finite(scale.map(v)),
                        label: tick_label(v, step),
                    })
                    .collect();
                let line = history
                    .batches()
                    .map(|p| (finite(scale.map(p.batch as f64)), y(p.accuracy)))
                    .collect();
                (ticks, line)
            }
            None => (Vec::new(), Vec::new()),
        };

        let dots: Vec<Dot> = match self.epoch_scale(history) {
            Some(scale) => history
                .epochs()
                .iter()
                .map(|p| Dot {
                    cx: finite(scale.map(p.epoch as f64)),
                    cy: y(p.accuracy),
                    epoch: p.epoch,
                    accuracy: finite(p.accuracy),
                })
                .collect(),
            None => Vec::new(),
        };
        let epoch_line = dots.iter().map(|d| (d.cx, d.cy)).collect();

        ChartFrame {
            width: self.width,
            height: self.height,
            margin_left: MARGIN_LEFT,
            margin_top: MARGIN_TOP,
            chart_width: self.chart_width,
            chart_height: self.chart_height,
            y_ticks,
            x_ticks,
            batch_line,
            epoch_line,
            dots,
        }
    }
}

fn clamp_size(size: f64, min: f64) -> f64 {
    if size.is_finite() {
        size.max(min)
    } else {
        min
    }
}

/// Non-finite coordinates collapse to 0.
fn finite(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
