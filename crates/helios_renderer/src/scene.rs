//! Scene description: primitives, materials and lights.
//!
//! A `Scene` is resolution-independent and cheap to clone; every
//! worker renders against its own clone so traversal scratch state is
//! never shared across threads.

use helios_core::{Color, WorkerCounters};
use helios_math::{Aabb, Interval, Ray, Vec3};

use crate::camera::Camera;

/// Phong-style surface material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMaterial {
    pub color: Color,
    /// Specular highlight strength.
    pub specular: f32,
    /// Specular exponent.
    pub shininess: f32,
    /// Fraction of light taken from the reflected direction.
    pub reflectivity: f32,
    /// Fraction of light taken from the refracted direction.
    pub transparency: f32,
    /// Index of refraction for transparent surfaces.
    pub ior: f32,
}

impl SurfaceMaterial {
    /// A plain diffuse material.
    pub fn diffuse(color: Color) -> Self {
        Self {
            color,
            specular: 0.2,
            shininess: 32.0,
            reflectivity: 0.0,
            transparency: 0.0,
            ior: 1.0,
        }
    }

    pub fn with_reflectivity(mut self, reflectivity: f32) -> Self {
        self.reflectivity = reflectivity;
        self
    }

    pub fn with_transparency(mut self, transparency: f32, ior: f32) -> Self {
        self.transparency = transparency;
        self.ior = ior;
        self
    }
}

/// A sphere primitive with a precomputed bounding box.
#[derive(Debug, Clone)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material: SurfaceMaterial,
    bbox: Aabb,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material: SurfaceMaterial) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        Self {
            center,
            radius,
            material,
            bbox: Aabb::from_points(center - rvec, center + rvec),
        }
    }
}

/// An infinite plane through `point` with the given normal.
#[derive(Debug, Clone)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
    pub material: SurfaceMaterial,
}

/// Traceable primitives.
#[derive(Debug, Clone)]
pub enum Primitive {
    Sphere(Sphere),
    Plane(Plane),
}

/// A point light source.
#[derive(Debug, Clone)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
}

/// Record of the closest ray/surface intersection.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub t: f32,
    pub point: Vec3,
    /// Always points against the incoming ray.
    pub normal: Vec3,
    pub front_face: bool,
    pub material: SurfaceMaterial,
}

/// The traceable scene handed to each worker.
#[derive(Debug, Clone)]
pub struct Scene {
    pub camera: Camera,
    pub primitives: Vec<Primitive>,
    pub lights: Vec<PointLight>,
    pub ambient: f32,
    pub background: Color,
}

impl Scene {
    /// Find the closest intersection along `ray` within `ray_t`,
    /// counting bounding-box and primitive tests as it goes.
    pub fn hit(&self, ray: &Ray, ray_t: Interval, counters: &mut WorkerCounters) -> Option<Hit> {
        let mut closest = ray_t.max;
        let mut best: Option<Hit> = None;

        for primitive in &self.primitives {
            let interval = Interval::new(ray_t.min, closest);
            if let Some(hit) = primitive.hit(ray, interval, counters) {
                closest = hit.t;
                best = Some(hit);
            }
        }

        best
    }

    /// True if anything blocks `ray` before `max_t` (shadow test).
    pub fn occluded(&self, ray: &Ray, max_t: f32, counters: &mut WorkerCounters) -> bool {
        self.hit(ray, Interval::new(1e-3, max_t), counters).is_some()
    }
}

impl Primitive {
    fn hit(&self, ray: &Ray, ray_t: Interval, counters: &mut WorkerCounters) -> Option<Hit> {
        match self {
            Primitive::Sphere(sphere) => {
                // Cheap bbox rejection before the quadratic
                counters.bbox_tests += 1;
                if !sphere.bbox.hit(ray, ray_t) {
                    return None;
                }
                counters.primitive_tests += 1;
                hit_sphere(sphere, ray, ray_t)
            }
            Primitive::Plane(plane) => {
                counters.primitive_tests += 1;
                hit_plane(plane, ray, ray_t)
            }
        }
    }
}

fn hit_sphere(sphere: &Sphere, ray: &Ray, ray_t: Interval) -> Option<Hit> {
    let oc = sphere.center - ray.origin;
    let a = ray.direction.length_squared();
    let h = ray.direction.dot(oc);
    let c = oc.length_squared() - sphere.radius * sphere.radius;

    let discriminant = h * h - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrtd = discriminant.sqrt();

    // Nearest root in the acceptable range
    let mut root = (h - sqrtd) / a;
    if !ray_t.surrounds(root) {
        root = (h + sqrtd) / a;
        if !ray_t.surrounds(root) {
            return None;
        }
    }

    let point = ray.at(root);
    let outward = (point - sphere.center) / sphere.radius;
    let front_face = ray.direction.dot(outward) < 0.0;
    Some(Hit {
        t: root,
        point,
        normal: if front_face { outward } else { -outward },
        front_face,
        material: sphere.material,
    })
}

fn hit_plane(plane: &Plane, ray: &Ray, ray_t: Interval) -> Option<Hit> {
    let denom = plane.normal.dot(ray.direction);
    if denom.abs() < 1e-6 {
        return None;
    }

    let t = plane.normal.dot(plane.point - ray.origin) / denom;
    if !ray_t.surrounds(t) {
        return None;
    }

    let front_face = denom < 0.0;
    Some(Hit {
        t,
        point: ray.at(t),
        normal: if front_face {
            plane.normal
        } else {
            -plane.normal
        },
        front_face,
        material: plane.material,
    })
}

/// The built-in demo scene: a ground plane, a diffuse sphere, a mirror
/// sphere and a glass sphere under two point lights.
pub fn demo_scene(width: u32, height: u32) -> Scene {
    let mut camera = Camera::new()
        .with_resolution(width, height)
        .with_position(
            Vec3::new(0.0, 1.2, 4.0),
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::Y,
        )
        .with_vfov(50.0);
    camera.initialize();

    Scene {
        camera,
        primitives: vec![
            Primitive::Plane(Plane {
                point: Vec3::ZERO,
                normal: Vec3::Y,
                material: SurfaceMaterial::diffuse(Color::new(0.6, 0.6, 0.6)),
            }),
            Primitive::Sphere(Sphere::new(
                Vec3::new(-1.3, 0.6, 0.0),
                0.6,
                SurfaceMaterial::diffuse(Color::new(0.8, 0.25, 0.2)),
            )),
            Primitive::Sphere(Sphere::new(
                Vec3::new(0.0, 0.7, -0.8),
                0.7,
                SurfaceMaterial::diffuse(Color::new(0.9, 0.9, 0.9)).with_reflectivity(0.7),
            )),
            Primitive::Sphere(Sphere::new(
                Vec3::new(1.3, 0.6, 0.3),
                0.6,
                SurfaceMaterial::diffuse(Color::new(0.95, 0.95, 1.0)).with_transparency(0.8, 1.5),
            )),
        ],
        lights: vec![
            PointLight {
                position: Vec3::new(-3.0, 4.0, 3.0),
                color: Color::ONE,
                intensity: 0.9,
            },
            PointLight {
                position: Vec3::new(3.0, 5.0, 1.0),
                color: Color::new(0.9, 0.9, 1.0),
                intensity: 0.5,
            },
        ],
        ambient: 0.08,
        background: Color::new(0.10, 0.12, 0.18),
    }
}
