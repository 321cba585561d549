//! Recursive Whitted-style ray tracing image function.

use helios_core::{color_to_rgb8, Color, ImageFunction, PointSample, RenderOptions, WorkerCounters};
use helios_math::{Interval, Ray, Vec3};

use crate::scene::Scene;

/// Ray-based renderer in the form of an image function.
///
/// Holds per-call scratch state (counters, point samples, recursion)
/// and therefore must be exclusively owned by one worker.
pub struct RayTracer {
    scene: Scene,
    width: u32,
    height: u32,
    options: RenderOptions,
    counters: WorkerCounters,
    points: Vec<PointSample>,
}

impl RayTracer {
    pub fn new(scene: Scene, width: u32, height: u32, options: RenderOptions) -> Self {
        Self {
            scene,
            width,
            height,
            options,
            counters: WorkerCounters::default(),
            points: Vec::new(),
        }
    }

    /// Drain the counters accumulated since the last call.
    pub fn take_counters(&mut self) -> WorkerCounters {
        self.counters.take()
    }

    /// Drain collected point-cloud samples.
    pub fn take_points(&mut self) -> Vec<PointSample> {
        std::mem::take(&mut self.points)
    }

    fn trace(&mut self, ray: &Ray, depth: u32) -> Color {
        self.trace_with_hit(ray, depth).0
    }

    /// Trace a ray, returning the color and the primary hit point (if
    /// any) for point-cloud collection.
    fn trace_with_hit(&mut self, ray: &Ray, depth: u32) -> (Color, Option<Vec3>) {
        self.counters.rays += 1;

        let hit = match self.scene.hit(
            ray,
            Interval::new(1e-3, f32::INFINITY),
            &mut self.counters,
        ) {
            Some(hit) => hit,
            None => return (self.scene.background, None),
        };
        self.counters.intersections += 1;

        let m = hit.material;
        let mut color = m.color * self.scene.ambient;

        // Direct lighting with optional shadow rays
        for i in 0..self.scene.lights.len() {
            let light = self.scene.lights[i].clone();
            let to_light = light.position - hit.point;
            let distance = to_light.length();
            let light_dir = to_light / distance;

            let n_dot_l = hit.normal.dot(light_dir);
            if n_dot_l <= 0.0 {
                continue;
            }

            if self.options.shadows {
                self.counters.rays += 1;
                let shadow_ray = Ray::new(hit.point + hit.normal * 1e-3, light_dir);
                if self.scene.occluded(&shadow_ray, distance, &mut self.counters) {
                    continue;
                }
            }

            let diffuse = m.color * light.color * (light.intensity * n_dot_l);
            let half = (light_dir - ray.direction).normalize();
            let spec = hit.normal.dot(half).max(0.0).powf(m.shininess);
            let specular = light.color * (m.specular * light.intensity * spec);
            color += diffuse + specular;
        }

        // Secondary rays; weight the local term by what the surface
        // does not reflect or transmit.
        let mut reflectivity = if self.options.reflections {
            m.reflectivity
        } else {
            0.0
        };
        let transparency = if self.options.refractions {
            m.transparency
        } else {
            0.0
        };
        color *= (1.0 - reflectivity - transparency).max(0.0);

        if depth > 0 {
            if transparency > 0.0 {
                let eta = if hit.front_face { 1.0 / m.ior } else { m.ior };
                match refract(ray.direction, hit.normal, eta) {
                    Some(refracted) => {
                        let secondary = Ray::new(hit.point - hit.normal * 1e-3, refracted);
                        color += self.trace(&secondary, depth - 1) * transparency;
                    }
                    // Total internal reflection folds into the mirror term
                    None => reflectivity += transparency,
                }
            }

            if reflectivity > 0.0 {
                let reflected = reflect(ray.direction, hit.normal);
                let secondary = Ray::new(hit.point + hit.normal * 1e-3, reflected);
                color += self.trace(&secondary, depth - 1) * reflectivity;
            }
        }

        (color, Some(hit.point))
    }
}

impl ImageFunction for RayTracer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn sample(&mut self, x: f32, y: f32) -> Color {
        let ray = self.scene.camera.ray_at(x, y);
        let (color, primary_hit) = self.trace_with_hit(&ray, self.options.max_depth);

        if self.options.point_cloud {
            if let Some(point) = primary_hit {
                self.points.push(PointSample::new(point, color_to_rgb8(color)));
            }
        }

        color
    }
}

fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Snell refraction; `None` on total internal reflection.
fn refract(v: Vec3, n: Vec3, eta: f32) -> Option<Vec3> {
    let cos_theta = (-v).dot(n).min(1.0);
    let sin2_theta = 1.0 - cos_theta * cos_theta;
    if eta * eta * sin2_theta > 1.0 {
        return None;
    }
    let out_perp = eta * (v + cos_theta * n);
    let out_parallel = -(1.0 - out_perp.length_squared()).abs().sqrt() * n;
    Some(out_perp + out_parallel)
}
