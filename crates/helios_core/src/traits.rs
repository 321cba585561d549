//! Trait seams between the dispatcher and a renderer implementation.

use thiserror::Error;

use crate::color::{Color, Rgb8};
use crate::counters::WorkerCounters;
use crate::sample::PointSample;

/// An unexpected failure inside a renderer.
///
/// Faults end the affected worker's remaining rows only; the session
/// folds them into its result instead of crashing the render.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RenderFault {
    pub message: String,
}

impl RenderFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Computes a color sample for a floating-point image coordinate.
///
/// Takes `&mut self` because sampling mutates per-call scratch state
/// (counters, RNG, recursion bookkeeping) - which is exactly why each
/// worker gets its own instance.
pub trait ImageFunction {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Sample the image at a continuous coordinate. (0.5, 0.5) is the
    /// center of the top-left pixel.
    fn sample(&mut self, x: f32, y: f32) -> Color;
}

/// Renders whole scanlines of the output raster.
///
/// One instance per worker; never shared across threads.
pub trait RowRenderer: Send {
    /// Render row `y` into `out` (`out.len()` == image width).
    fn render_row(&mut self, y: u32, out: &mut [Rgb8]) -> Result<(), RenderFault>;

    /// Drain the counters accumulated since the last call.
    fn take_counters(&mut self) -> WorkerCounters;

    /// Drain point-cloud samples gathered since the last call.
    /// Renderers without point-cloud support return nothing.
    fn take_points(&mut self) -> Vec<PointSample> {
        Vec::new()
    }
}

/// Builds one independent renderer per worker ordinal.
///
/// The instances must not share mutable state; the dispatcher hands
/// each one to a different thread.
pub trait WorkerFactory: Send + Sync {
    fn build(&self, ordinal: u32) -> Result<Box<dyn RowRenderer>, RenderFault>;
}
