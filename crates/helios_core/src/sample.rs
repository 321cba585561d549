//! Point-cloud sample type.

use crate::color::Rgb8;
use helios_math::Vec3;

/// One 3D sample gathered as a rendering byproduct: the position of a
/// qualifying ray/surface intersection and the surface color there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSample {
    pub position: Vec3,
    pub color: Rgb8,
}

impl PointSample {
    pub fn new(position: Vec3, color: Rgb8) -> Self {
        Self { position, color }
    }
}
