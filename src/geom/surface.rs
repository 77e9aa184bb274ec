use super::core::{Point3, Tolerance, Vec3};

/// Point and unit normal of a surface at one `(u, v)` parameter pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    pub point: Point3,
    /// Always unit length and finite.
    pub normal: Vec3,
    /// Set when dP/du × dP/dv vanished at the requested parameters and the
    /// normal had to be recovered (nudged evaluation or the +Z fallback).
    pub degenerate_normal: bool,
}

/// A parametric surface over the unit square that the tessellators can sample.
pub trait Surface {
    /// Returns the point and partial derivatives `(dP/du, dP/dv)` at `(u, v)`.
    fn frame_at(&self, u: f64, v: f64) -> (Point3, Vec3, Vec3);

    /// Parameter pair a degenerate normal is recovered from: a small step from
    /// `(u, v)` toward the centre of the domain.
    #[must_use]
    fn nudge_toward_center(&self, u: f64, v: f64) -> (f64, f64) {
        (
            u + (0.5 - u).signum() * NORMAL_NUDGE,
            v + (0.5 - v).signum() * NORMAL_NUDGE,
        )
    }

    /// Evaluates the point and unit normal at `(u, v)`.
    ///
    /// A vanishing cross product (collapsed corner, parallel tangents) never
    /// produces a NaN: the tangents are re-evaluated slightly inside the
    /// domain, and if that is still degenerate the normal falls back to +Z.
    #[must_use]
    fn evaluate(&self, u: f64, v: f64) -> SurfaceSample {
        let (point, du, dv) = self.frame_at(u, v);
        if let Some(normal) = non_degenerate_normal(du, dv) {
            return SurfaceSample {
                point,
                normal,
                degenerate_normal: false,
            };
        }

        let (nu, nv) = self.nudge_toward_center(u, v);
        let (_, du, dv) = self.frame_at(nu, nv);
        let normal = non_degenerate_normal(du, dv).unwrap_or(Vec3::Z);
        log::debug!("degenerate surface normal at ({u}, {v}), recovered {normal:?}");

        SurfaceSample {
            point,
            normal,
            degenerate_normal: true,
        }
    }
}

/// Parameter distance used to step off a degenerate point.
pub const NORMAL_NUDGE: f64 = 1e-4;

/// Unit normal of the tangent pair, or `None` when a tangent vanishes or the
/// two are parallel.
///
/// Both tests are relative to the tangent lengths, so the result does not
/// depend on the size of the surface.
fn non_degenerate_normal(du: Vec3, dv: Vec3) -> Option<Vec3> {
    let eps = Tolerance::ZERO_LENGTH.eps;
    let (lu, lv) = (du.length(), dv.length());
    if !(lu.min(lv) > eps * lu.max(lv)) {
        return None;
    }
    let n = du.cross(dv);
    if n.length() <= eps * lu * lv {
        return None;
    }
    n.normalized()
}
