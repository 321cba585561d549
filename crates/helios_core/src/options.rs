//! Render capability flags.

use serde::{Deserialize, Serialize};

/// Configuration a renderer is built with.
///
/// This is a capability-tagged value rather than a runtime type check:
/// the dispatcher never inspects a renderer's concrete type, it only
/// forwards these flags to the factory (and to remote clients, which
/// must build an equivalent renderer on their side).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Supersampling grid side; 1 means one sample per pixel.
    pub supersampling: u32,
    /// Jitter sub-pixel sample positions.
    pub jitter: bool,
    /// Cast shadow rays toward light sources.
    pub shadows: bool,
    /// Follow specular reflections.
    pub reflections: bool,
    /// Follow refractions through transparent materials.
    pub refractions: bool,
    /// Maximum recursion depth for secondary rays.
    pub max_depth: u32,
    /// Collect point-cloud samples at primary hits.
    pub point_cloud: bool,
    /// Base seed; each worker derives its own stream from this and
    /// its ordinal.
    pub seed: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            supersampling: 2,
            jitter: false,
            shadows: true,
            reflections: true,
            refractions: true,
            max_depth: 8,
            point_cloud: false,
            seed: 12,
        }
    }
}

impl RenderOptions {
    /// Samples per pixel implied by the supersampling grid.
    pub fn samples_per_pixel(&self) -> u32 {
        self.supersampling.max(1) * self.supersampling.max(1)
    }
}
