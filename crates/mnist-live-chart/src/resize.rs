// Resize watch — keep the layout in step with the surface size
//
// Polls the surface every RESIZE_POLL_INTERVAL. A changed size rebuilds the
// layout and redraws; an unchanged one costs a comparison. The task ends on
// its own once the surface reports it is detached or the chart drops the
// attachment (`detach`, or `attach` of another surface).

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::chart::{ChartSurface, TrainingChart};

pub const RESIZE_POLL_INTERVAL: Duration = Duration::from_millis(150);

/// Attach `surface` to `chart` and spawn the polling task.
///
/// The first poll happens immediately, so the chart is laid out and drawn
/// before the first interval elapses. Abort the returned handle to stop
/// early. Must be called from within a tokio runtime.
pub fn spawn_resize_watch<S: ChartSurface>(chart: TrainingChart, surface: Arc<S>) -> JoinHandle<()> {
    let generation = chart.attach(surface.clone());
    tokio::spawn(async move {
        let mut last: Option<(f64, f64)> = None;
        loop {
            if !chart.is_attached_as(generation) {
                break;
            }
            let size = surface.bounding_size();
            if last != Some(size) {
                debug!(width = size.0, height = size.1, "chart surface resized");
                last = Some(size);
                if !chart.resize_as(generation, size.0, size.1) {
                    break;
                }
            }
            if !surface.is_attached() {
                break;
            }
            tokio::time::sleep(RESIZE_POLL_INTERVAL).await;
        }
        debug!("chart surface detached, resize watch stopped");
    })
}
