mod test_adaptive_basic;
mod test_curve_basic;

use rand::Rng;
use rand::rngs::StdRng;

use crate::geom::{ControlGrid, Point3, Surface, Vec3};

/// Control points evenly spaced on the unit square in z = 0; the patch is the
/// plane `P(u, v) = (u, v, 0)`.
fn planar_grid() -> ControlGrid {
    std::array::from_fn(|row| {
        std::array::from_fn(|col| Point3::new(col as f64 / 3.0, row as f64 / 3.0, 0.0))
    })
}

/// A 3×3 footprint with the four interior control points lifted.
fn dome_grid() -> ControlGrid {
    std::array::from_fn(|row| {
        std::array::from_fn(|col| {
            let interior = (1..=2).contains(&row) && (1..=2).contains(&col);
            Point3::new(col as f64, row as f64, if interior { 2.0 } else { 0.0 })
        })
    })
}

fn random_grid(rng: &mut StdRng) -> ControlGrid {
    std::array::from_fn(|_| {
        std::array::from_fn(|_| {
            Point3::new(
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
            )
        })
    })
}

/// Exact eighth of a sphere: `u` sweeps the azimuth, `v` the polar angle
/// from the north pole to the equator.
struct SphereOctant {
    radius: f64,
}

impl Surface for SphereOctant {
    fn frame_at(&self, u: f64, v: f64) -> (Point3, Vec3, Vec3) {
        let quarter = std::f64::consts::FRAC_PI_2;
        let (sin_t, cos_t) = (u * quarter).sin_cos();
        let (sin_p, cos_p) = (v * quarter).sin_cos();
        let r = self.radius;

        let point = Point3::new(r * sin_p * cos_t, r * sin_p * sin_t, r * cos_p);
        let du = Vec3::new(-sin_p * sin_t, sin_p * cos_t, 0.0) * (r * quarter);
        let dv = Vec3::new(cos_p * cos_t, cos_p * sin_t, -sin_p) * (r * quarter);
        (point, du, dv)
    }
}
