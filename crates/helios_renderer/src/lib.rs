//! Helios renderer - a Whitted-style CPU ray tracer.
//!
//! Implements the `helios_core` contracts with:
//! - Recursive ray tracing with shadow/reflection/refraction toggles
//! - Supersampling with optional jitter
//! - Per-worker deterministic RNG streams
//! - Ray/intersection/bbox/primitive counters
//! - Optional point-cloud sample collection at primary hits

mod camera;
mod factory;
mod sampler;
mod scene;
mod tracer;

pub use camera::Camera;
pub use factory::TracerFactory;
pub use sampler::SamplingRenderer;
pub use scene::{demo_scene, Hit, Plane, PointLight, Primitive, Scene, Sphere, SurfaceMaterial};
pub use tracer::RayTracer;

pub use helios_math::{Aabb, Interval, Ray, Vec3};
