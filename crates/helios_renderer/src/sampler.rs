//! Supersampling scanline renderer on top of the ray tracer.

use helios_core::{
    color_to_rgb8, Color, ImageFunction, RenderFault, Rgb8, RowRenderer, PointSample,
    WorkerCounters,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::tracer::RayTracer;

/// Fills raster rows by averaging a jittered supersampling grid over
/// each pixel.
///
/// The RNG stream is seeded deterministically per worker, so repeated
/// renders with the same seed and worker count are identical.
pub struct SamplingRenderer {
    tracer: RayTracer,
    rng: StdRng,
    grid: u32,
    jitter: bool,
}

impl SamplingRenderer {
    pub fn new(tracer: RayTracer, grid: u32, jitter: bool, seed: u64) -> Self {
        Self {
            tracer,
            rng: StdRng::seed_from_u64(seed),
            grid: grid.max(1),
            jitter,
        }
    }

    fn pixel(&mut self, x: u32, y: u32) -> Color {
        let grid = self.grid;
        let step = 1.0 / grid as f32;
        let mut acc = Color::ZERO;

        for sy in 0..grid {
            for sx in 0..grid {
                let (jx, jy) = if self.jitter {
                    (
                        (self.rng.gen::<f32>() - 0.5) * step,
                        (self.rng.gen::<f32>() - 0.5) * step,
                    )
                } else {
                    (0.0, 0.0)
                };
                let px = x as f32 + (sx as f32 + 0.5) * step + jx;
                let py = y as f32 + (sy as f32 + 0.5) * step + jy;
                acc += self.tracer.sample(px, py);
            }
        }

        acc / (grid * grid) as f32
    }
}

impl RowRenderer for SamplingRenderer {
    fn render_row(&mut self, y: u32, out: &mut [Rgb8]) -> Result<(), RenderFault> {
        for (x, px) in out.iter_mut().enumerate() {
            let color = self.pixel(x as u32, y);
            if !color.is_finite() {
                return Err(RenderFault::new(format!(
                    "non-finite sample at ({x}, {y})"
                )));
            }
            *px = color_to_rgb8(color);
        }
        Ok(())
    }

    fn take_counters(&mut self) -> WorkerCounters {
        self.tracer.take_counters()
    }

    fn take_points(&mut self) -> Vec<PointSample> {
        self.tracer.take_points()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::demo_scene;
    use helios_core::RenderOptions;

    fn renderer(seed: u64) -> SamplingRenderer {
        let options = RenderOptions {
            jitter: true,
            ..RenderOptions::default()
        };
        let tracer = RayTracer::new(demo_scene(32, 32), 32, 32, options);
        SamplingRenderer::new(tracer, 2, true, seed)
    }

    #[test]
    fn test_row_is_deterministic_for_seed() {
        let mut a = renderer(7);
        let mut b = renderer(7);
        let mut row_a = vec![Rgb8::BLACK; 32];
        let mut row_b = vec![Rgb8::BLACK; 32];

        a.render_row(16, &mut row_a).unwrap();
        b.render_row(16, &mut row_b).unwrap();
        assert_eq!(row_a, row_b);

        // A different seed jitters differently somewhere in the row
        let mut c = renderer(8);
        let mut row_c = vec![Rgb8::BLACK; 32];
        c.render_row(16, &mut row_c).unwrap();
        assert_ne!(row_a, row_c);
    }

    #[test]
    fn test_row_not_all_background() {
        let mut r = renderer(1);
        let mut row = vec![Rgb8::BLACK; 32];
        r.render_row(20, &mut row).unwrap();

        let background = color_to_rgb8(demo_scene(32, 32).background);
        assert!(row.iter().any(|px| *px != background));

        let counters = r.take_counters();
        assert!(counters.rays >= (32 * 4) as u64);
    }
}
