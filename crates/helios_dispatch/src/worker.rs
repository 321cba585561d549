//! The local worker loop.

use helios_core::{RenderFault, Rgb8, RowRenderer};

use crate::session::SessionShared;

pub(crate) struct WorkerOutput {
    pub rows_rendered: u32,
    pub fault: Option<(u32, RenderFault)>,
}

/// Render a set of rows with a privately-owned renderer.
///
/// The continue flag is polled once per scanline, so cancellation
/// latency is bounded by one row's render time and partial rows are
/// never written. Counters are flushed to the shared aggregator after
/// every row; point samples are batched the same way.
pub(crate) fn render_rows(
    renderer: &mut dyn RowRenderer,
    rows: &mut [(u32, &mut [Rgb8])],
    shared: &SessionShared,
) -> WorkerOutput {
    let mut output = WorkerOutput {
        rows_rendered: 0,
        fault: None,
    };

    for (y, slice) in rows.iter_mut() {
        if !shared.progress.should_continue() {
            break;
        }

        let status = renderer.render_row(*y, slice);
        shared.stats.record(renderer.take_counters());
        if shared.collect_points {
            let points = renderer.take_points();
            if !points.is_empty() {
                shared.point_cloud.extend(points);
            }
        }

        match status {
            Ok(()) => output.rows_rendered += 1,
            Err(fault) => {
                output.fault = Some((*y, fault));
                break;
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_cloud::PointCloud;
    use crate::progress::Progress;
    use crate::stats::Statistics;
    use helios_core::{PointSample, WorkerCounters};
    use helios_math::Vec3;
    use std::sync::Arc;
    use std::time::Duration;

    struct StubRenderer {
        fail_at: Option<u32>,
        counters: WorkerCounters,
        points: Vec<PointSample>,
    }

    impl RowRenderer for StubRenderer {
        fn render_row(&mut self, y: u32, out: &mut [Rgb8]) -> Result<(), RenderFault> {
            if self.fail_at == Some(y) {
                return Err(RenderFault::new("stub fault"));
            }
            for px in out.iter_mut() {
                *px = Rgb8::new(y as u8, 0, 0);
            }
            self.counters.rays += out.len() as u64;
            self.points
                .push(PointSample::new(Vec3::new(y as f32, 0.0, 0.0), Rgb8::BLACK));
            Ok(())
        }

        fn take_counters(&mut self) -> WorkerCounters {
            self.counters.take()
        }

        fn take_points(&mut self) -> Vec<PointSample> {
            std::mem::take(&mut self.points)
        }
    }

    fn shared(collect_points: bool) -> SessionShared {
        let shared = SessionShared {
            progress: Progress::new(),
            stats: Statistics::new(),
            point_cloud: Arc::new(PointCloud::new()),
            collect_points,
        };
        shared.progress.reset(Duration::from_millis(1000));
        shared
    }

    fn rows_of(width: usize, ys: &[u32]) -> Vec<(u32, Vec<Rgb8>)> {
        ys.iter()
            .map(|y| (*y, vec![Rgb8::BLACK; width]))
            .collect()
    }

    #[test]
    fn test_renders_all_rows_and_flushes() {
        let mut renderer = StubRenderer {
            fail_at: None,
            counters: WorkerCounters::default(),
            points: Vec::new(),
        };
        let shared = shared(true);
        let mut storage = rows_of(8, &[0, 3, 6]);
        let mut rows: Vec<(u32, &mut [Rgb8])> = storage
            .iter_mut()
            .map(|(y, row)| (*y, row.as_mut_slice()))
            .collect();

        let output = render_rows(&mut renderer, &mut rows, &shared);
        assert_eq!(output.rows_rendered, 3);
        assert!(output.fault.is_none());
        assert_eq!(shared.stats.snapshot().rays, 24);
        assert_eq!(shared.point_cloud.len(), 3);
        assert_eq!(storage[1].1[0], Rgb8::new(3, 0, 0));
    }

    #[test]
    fn test_fault_stops_that_worker_only() {
        let mut renderer = StubRenderer {
            fail_at: Some(3),
            counters: WorkerCounters::default(),
            points: Vec::new(),
        };
        let shared = shared(false);
        let mut storage = rows_of(4, &[0, 3, 6]);
        let mut rows: Vec<(u32, &mut [Rgb8])> = storage
            .iter_mut()
            .map(|(y, row)| (*y, row.as_mut_slice()))
            .collect();

        let output = render_rows(&mut renderer, &mut rows, &shared);
        assert_eq!(output.rows_rendered, 1);
        let (row, _) = output.fault.unwrap();
        assert_eq!(row, 3);
        // Row 6 was never attempted
        assert_eq!(storage[2].1[0], Rgb8::BLACK);
    }

    #[test]
    fn test_cancelled_before_start_renders_nothing() {
        let mut renderer = StubRenderer {
            fail_at: None,
            counters: WorkerCounters::default(),
            points: Vec::new(),
        };
        let shared = shared(false);
        shared.progress.request_stop();

        let mut storage = rows_of(4, &[0, 1]);
        let mut rows: Vec<(u32, &mut [Rgb8])> = storage
            .iter_mut()
            .map(|(y, row)| (*y, row.as_mut_slice()))
            .collect();

        let output = render_rows(&mut renderer, &mut rows, &shared);
        assert_eq!(output.rows_rendered, 0);
        assert!(storage.iter().all(|(_, row)| row[0] == Rgb8::BLACK));
    }
}
