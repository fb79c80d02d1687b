// Tests for mnist-live-chart: bounded history, rendering, resize watch

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mnist_live_chart::{
    spawn_resize_watch, BatchPoint, ChartFrame, ChartSurface, EpochPoint, SvgFileSurface,
    TrainingChart, RESIZE_POLL_INTERVAL,
};

fn bp(batch: u64, accuracy: f64) -> BatchPoint {
    BatchPoint { batch, accuracy }
}

fn ep(epoch: u64, accuracy: f64) -> EpochPoint {
    EpochPoint {
        batch: epoch * 10,
        accuracy,
        epoch,
    }
}

/// A surface whose size and attachment the test controls.
struct Probe {
    size: Mutex<(f64, f64)>,
    attached: AtomicBool,
    draws: AtomicUsize,
    last: Mutex<Option<ChartFrame>>,
}

impl Probe {
    fn new(width: f64, height: f64) -> Arc<Self> {
        Arc::new(Self {
            size: Mutex::new((width, height)),
            attached: AtomicBool::new(true),
            draws: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }

    fn set_size(&self, width: f64, height: f64) {
        *self.size.lock().unwrap() = (width, height);
    }

    fn draws(&self) -> usize {
        self.draws.load(Ordering::SeqCst)
    }

    fn last_width(&self) -> f64 {
        self.last.lock().unwrap().as_ref().map(|f| f.width).unwrap_or(0.0)
    }
}

impl ChartSurface for Probe {
    fn bounding_size(&self) -> (f64, f64) {
        *self.size.lock().unwrap()
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn draw(&self, frame: &ChartFrame) -> io::Result<()> {
        self.draws.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(frame.clone());
        Ok(())
    }
}

// Bounded history

#[test]
fn test_four_pushes_keep_two() {
    let chart = TrainingChart::new();
    for (b, acc) in [(1, 0.1), (2, 0.2), (3, 0.3), (4, 0.4)] {
        chart.push_batch_point(bp(b, acc), 2);
        assert!(chart.batch_points().len() <= 3);
    }
    assert_eq!(
        chart.batch_points(),
        vec![bp(2, 0.2), bp(3, 0.3), bp(4, 0.4)]
    );
}

#[test]
fn test_batch_series_never_exceeds_keep_plus_one() {
    for keep in [0usize, 1, 5, 117] {
        let chart = TrainingChart::new();
        for b in 1..=300u64 {
            chart.push_batch_point(bp(b, 0.5), keep);
            assert!(chart.batch_points().len() <= keep + 1);
        }
        let last = chart.batch_points().last().copied();
        assert_eq!(last, Some(bp(300, 0.5)));
    }
}

#[test]
fn test_epoch_series_only_grows() {
    let chart = TrainingChart::new();
    let mut previous = 0;
    for e in 1..=25 {
        chart.push_batch_point(bp(e * 10, 0.9), 1);
        chart.push_epoch_point(ep(e, 0.9));
        let len = chart.epoch_points().len();
        assert!(len > previous);
        previous = len;
    }
    assert_eq!(previous, 25);
    assert_eq!(chart.epoch_points()[0], ep(1, 0.9));
}

// Rendering

#[test]
fn test_render_empty_and_degenerate() {
    let chart = TrainingChart::new();
    for (w, h) in [(0.0, 0.0), (60.0, 45.0), (640.0, 320.0)] {
        let frame = chart.render_at(w, h);
        assert!(frame.dots.is_empty());
        assert!(frame.epoch_line.is_empty());
        let svg = frame.to_svg();
        assert!(!svg.contains("NaN"), "{svg}");
        assert!(!svg.contains("inf"), "{svg}");
    }

    chart.push_epoch_point(ep(1, 0.98));
    let frame = chart.render_at(640.0, 320.0);
    assert_eq!(frame.dots.len(), 1);
    assert_eq!(frame.dots[0].cx, frame.chart_width / 2.0);
    assert!(!frame.to_svg().contains("NaN"));
}

#[test]
fn test_tooltip_over_epoch_dot() {
    let chart = TrainingChart::new();
    chart.push_epoch_point(ep(1, 0.91));
    chart.push_epoch_point(ep(2, 0.9876));
    let frame = chart.render_at(640.0, 320.0);
    let dot = frame.dots[1];
    let tip = frame.hit_test(dot.cx + 3.0, dot.cy - 3.0).unwrap();
    assert_eq!(tip.epoch, 2);
    assert_eq!(tip.accuracy, "98.8%");
    assert!(frame.hit_test(dot.cx + 20.0, dot.cy).is_none());
}

#[test]
fn test_svg_file_surface() {
    let dir = tempfile::tempdir().unwrap();
    let surface = Arc::new(SvgFileSurface::new(dir.path().join("chart.svg"), 480.0, 240.0));
    let chart = TrainingChart::new();
    chart.attach(surface.clone());
    chart.resize(480.0, 240.0);
    chart.push_epoch_point(ep(1, 0.95));

    let svg = std::fs::read_to_string(surface.path()).unwrap();
    assert!(svg.contains(r#"width="480px""#));
    assert!(svg.contains(r#"class="dot""#));
    assert!(svg.contains("95.0%"));

    surface.close();
    std::fs::remove_file(surface.path()).unwrap();
    chart.push_epoch_point(ep(2, 0.96));
    assert!(!surface.path().exists());
}

// Resize watch

#[tokio::test(start_paused = true)]
async fn test_resize_watch_tracks_size_until_detached() {
    let chart = TrainingChart::new();
    let probe = Probe::new(320.0, 200.0);
    let handle = spawn_resize_watch(chart.clone(), probe.clone());

    // First poll lays out and draws immediately.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(probe.draws(), 1);
    assert_eq!(probe.last_width(), 320.0);

    // Unchanged size: polls do no work.
    tokio::time::sleep(RESIZE_POLL_INTERVAL * 3).await;
    assert_eq!(probe.draws(), 1);

    // Pushes redraw through the attached surface.
    chart.push_batch_point(bp(1, 0.5), 10);
    assert_eq!(probe.draws(), 2);

    probe.set_size(500.0, 260.0);
    tokio::time::sleep(RESIZE_POLL_INTERVAL).await;
    assert_eq!(probe.draws(), 3);
    assert_eq!(probe.last_width(), 500.0);

    probe.attached.store(false, Ordering::SeqCst);
    tokio::time::timeout(RESIZE_POLL_INTERVAL * 2, handle)
        .await
        .expect("watch should stop once detached")
        .unwrap();

    // Detached surfaces are not drawn on.
    chart.push_batch_point(bp(2, 0.6), 10);
    assert_eq!(probe.draws(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_resize_watch_stops_when_chart_detaches() {
    let chart = TrainingChart::new();
    let probe = Probe::new(320.0, 200.0);
    let handle = spawn_resize_watch(chart.clone(), probe.clone());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(probe.draws(), 1);

    // The surface itself stays attached; only the chart lets go.
    assert!(chart.detach().is_some());
    probe.set_size(500.0, 260.0);
    tokio::time::timeout(RESIZE_POLL_INTERVAL * 2, handle)
        .await
        .expect("watch should stop once the chart detaches")
        .unwrap();

    tokio::time::sleep(RESIZE_POLL_INTERVAL * 20).await;
    assert_eq!(probe.draws(), 1);
    assert!(chart.frame().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_resize_watch_ends_when_another_surface_attaches() {
    let chart = TrainingChart::new();
    let first = Probe::new(320.0, 200.0);
    let handle = spawn_resize_watch(chart.clone(), first.clone());
    tokio::time::sleep(Duration::from_millis(10)).await;

    let second = Probe::new(400.0, 300.0);
    let replacement = spawn_resize_watch(chart.clone(), second.clone());
    tokio::time::timeout(RESIZE_POLL_INTERVAL * 2, handle)
        .await
        .expect("old watch should stop")
        .unwrap();

    first.set_size(100.0, 100.0);
    tokio::time::sleep(RESIZE_POLL_INTERVAL * 2).await;
    assert_eq!(first.last_width(), 320.0);
    assert_eq!(second.last_width(), 400.0);
    replacement.abort();
}

#[tokio::test(start_paused = true)]
async fn test_resize_watch_can_be_aborted() {
    let chart = TrainingChart::new();
    let probe = Probe::new(320.0, 200.0);
    let handle = spawn_resize_watch(chart.clone(), probe.clone());
    tokio::time::sleep(Duration::from_millis(10)).await;

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());

    probe.set_size(100.0, 100.0);
    tokio::time::sleep(RESIZE_POLL_INTERVAL * 2).await;
    assert_eq!(probe.last_width(), 320.0);
}
