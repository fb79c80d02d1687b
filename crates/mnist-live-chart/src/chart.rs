// TrainingChart — shared handle over the metric history and its surface
//
// Clones share one history. Every push re-renders onto the attached surface
// once a layout exists; the layout is created by the first `resize`, which
// the resize watch issues as soon as it starts. The mutex is only held for
// synchronous work, never across an await.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::frame::ChartFrame;
use crate::layout::ChartLayout;
use crate::series::{BatchPoint, EpochPoint, MetricHistory};

/// Something a chart can be drawn on.
pub trait ChartSurface: Send + Sync + 'static {
    /// Current outer size in pixels, `(width, height)`.
    fn bounding_size(&self) -> (f64, f64);

    /// `false` once the surface is gone; drawing and resize polling stop.
    fn is_attached(&self) -> bool;

    fn draw(&self, frame: &ChartFrame) -> io::Result<()>;
}

struct ChartState {
    history: MetricHistory,
    layout: Option<ChartLayout>,
    surface: Option<Arc<dyn ChartSurface>>,
    /// Bumped by every attach and detach.
    generation: u64,
}

impl ChartState {
    fn redraw(&self) {
        let (Some(layout), Some(surface)) = (&self.layout, &self.surface) else {
            return;
        };
        if !surface.is_attached() {
            return;
        }
        let frame = layout.render(&self.history);
        if let Err(e) = surface.draw(&frame) {
            warn!(error = %e, "failed to draw training chart");
        }
    }
}

/// Accuracy chart over a bounded batch series and the epoch series.
#[derive(Clone)]
pub struct TrainingChart {
    state: Arc<Mutex<ChartState>>,
}

impl Default for TrainingChart {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TrainingChart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("TrainingChart")
            .field("batch_points", &state.history.batch_len())
            .field("epoch_points", &state.history.epoch_len())
            .field("layout", &state.layout.map(|l| l.size()))
            .field("attached", &state.surface.is_some())
            .finish()
    }
}

impl TrainingChart {
    /// A detached chart whose batch series starts at `{0, 0}`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ChartState {
                history: MetricHistory::seeded(),
                layout: None,
                surface: None,
                generation: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Draw on `surface` from now on. Nothing is drawn until the first
    /// [`resize`](Self::resize).
    ///
    /// Returns the attachment generation; it stays current until the next
    /// `attach` or `detach`.
    pub fn attach(&self, surface: Arc<dyn ChartSurface>) -> u64 {
        let mut state = self.lock();
        state.surface = Some(surface);
        state.generation += 1;
        state.generation
    }

    /// Stop drawing; returns the previous surface. Resize watches started
    /// for the old attachment end at their next poll.
    pub fn detach(&self) -> Option<Arc<dyn ChartSurface>> {
        let mut state = self.lock();
        state.layout = None;
        state.generation += 1;
        state.surface.take()
    }

    /// Whether the attachment made at `generation` is still in place.
    pub fn is_attached_as(&self, generation: u64) -> bool {
        let state = self.lock();
        state.generation == generation && state.surface.is_some()
    }

    /// Rebuild the layout for a new surface size and redraw.
    pub fn resize(&self, width: f64, height: f64) {
        Self::relayout(&mut self.lock(), width, height);
    }

    /// [`resize`](Self::resize), but only while the attachment made at
    /// `generation` is current. Returns whether it was.
    pub(crate) fn resize_as(&self, generation: u64, width: f64, height: f64) -> bool {
        let mut state = self.lock();
        if state.generation != generation || state.surface.is_none() {
            return false;
        }
        Self::relayout(&mut state, width, height);
        true
    }

    fn relayout(state: &mut ChartState, width: f64, height: f64) {
        let layout = ChartLayout::new(width, height);
        debug!(width = layout.size().0, height = layout.size().1, "chart layout rebuilt");
        state.layout = Some(layout);
        state.redraw();
    }

    /// Append a batch point, keeping at most `keep + 1` of them.
    pub fn push_batch_point(&self, point: BatchPoint, keep: usize) {
        let mut state = self.lock();
        state.history.push_batch(point, keep);
        state.redraw();
    }

    pub fn push_epoch_point(&self, point: EpochPoint) {
        let mut state = self.lock();
        state.history.push_epoch(point);
        state.redraw();
    }

    /// Snapshot of the history.
    pub fn history(&self) -> MetricHistory {
        self.lock().history.clone()
    }

    pub fn batch_points(&self) -> Vec<BatchPoint> {
        self.lock().history.batches().copied().collect()
    }

    pub fn epoch_points(&self) -> Vec<EpochPoint> {
        self.lock().history.epochs().to_vec()
    }

    /// The frame for the current layout, if one exists.
    pub fn frame(&self) -> Option<ChartFrame> {
        let state = self.lock();
        state.layout.map(|l| l.render(&state.history))
    }

    /// Render at an arbitrary size without touching the attached surface.
    pub fn render_at(&self, width: f64, height: f64) -> ChartFrame {
        ChartLayout::new(width, height).render(&self.lock().history)
    }
}

/// Writes every frame to an SVG file, replacing the previous one.
#[derive(Debug)]
pub struct SvgFileSurface {
    path: PathBuf,
    size: (f64, f64),
    attached: AtomicBool,
}

impl SvgFileSurface {
    pub fn new(path: impl Into<PathBuf>, width: f64, height: f64) -> Self {
        Self {
            path: path.into(),
            size: (width, height),
            attached: AtomicBool::new(true),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mark the surface as gone. Later frames are not written.
    pub fn close(&self) {
        self.attached.store(false, Ordering::Release);
    }
}

impl ChartSurface for SvgFileSurface {
    fn bounding_size(&self) -> (f64, f64) {
        self.size
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    fn draw(&self, frame: &ChartFrame) -> io::Result<()> {
        std::fs::write(&self.path, frame.to_svg())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counting {
        draws: AtomicUsize,
        fail: bool,
    }

    impl ChartSurface for Counting {
        fn bounding_size(&self) -> (f64, f64) {
            (300.0, 200.0)
        }

        fn is_attached(&self) -> bool {
            true
        }

        fn draw(&self, _frame: &ChartFrame) -> io::Result<()> {
            self.draws.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(io::Error::other("disk full"))
            } else {
                Ok(())
            }
        }
    }

    fn point(batch: u64) -> BatchPoint {
        BatchPoint {
            batch,
            accuracy: 0.5,
        }
    }

    #[test]
    fn test_no_draw_without_layout() {
        let chart = TrainingChart::new();
        let surface = Arc::new(Counting::default());
        chart.attach(surface.clone());
        chart.push_batch_point(point(1), 10);
        assert_eq!(surface.draws.load(Ordering::SeqCst), 0);
        assert!(chart.frame().is_none());

        chart.resize(300.0, 200.0);
        chart.push_batch_point(point(2), 10);
        assert_eq!(surface.draws.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clones_share_history() {
        let chart = TrainingChart::new();
        let other = chart.clone();
        other.push_batch_point(point(1), 10);
        assert_eq!(chart.batch_points().len(), 2);
    }

    #[test]
    fn test_draw_failure_is_not_fatal() {
        let chart = TrainingChart::new();
        let surface = Arc::new(Counting {
            draws: AtomicUsize::new(0),
            fail: true,
        });
        chart.attach(surface.clone());
        chart.resize(300.0, 200.0);
        chart.push_epoch_point(EpochPoint {
            batch: 1,
            accuracy: 0.9,
            epoch: 1,
        });
        assert_eq!(surface.draws.load(Ordering::SeqCst), 2);
        assert_eq!(chart.epoch_points().len(), 1);
    }

    #[test]
    fn test_detach_stops_drawing() {
        let chart = TrainingChart::new();
        let surface = Arc::new(Counting::default());
        chart.attach(surface.clone());
        chart.resize(300.0, 200.0);
        assert!(chart.detach().is_some());
        chart.push_batch_point(point(1), 10);
        assert_eq!(surface.draws.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_generation_tracks_attachment() {
        let chart = TrainingChart::new();
        let first = chart.attach(Arc::new(Counting::default()));
        assert!(chart.is_attached_as(first));

        let second = chart.attach(Arc::new(Counting::default()));
        assert!(!chart.is_attached_as(first));
        assert!(chart.is_attached_as(second));

        chart.detach();
        assert!(!chart.is_attached_as(second));
    }
}
