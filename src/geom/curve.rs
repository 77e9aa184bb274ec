//! Cubic Bézier curves evaluated with de Casteljau's algorithm.

use super::core::{Point3, Vec3};

/// Point and first derivative of a curve at one parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    pub point: Point3,
    /// dP/du, unnormalized (for a cubic this is `3 * (E - D)`).
    pub tangent: Vec3,
}

/// One cubic Bézier segment with control points `p0..p3`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier3 {
    pub p0: Point3,
    pub p1: Point3,
    pub p2: Point3,
    pub p3: Point3,
}

impl CubicBezier3 {
    #[must_use]
    pub const fn new(p0: Point3, p1: Point3, p2: Point3, p3: Point3) -> Self {
        Self { p0, p1, p2, p3 }
    }

    #[must_use]
    pub const fn from_array(points: [Point3; 4]) -> Self {
        Self::new(points[0], points[1], points[2], points[3])
    }

    #[must_use]
    pub const fn control_points(&self) -> [Point3; 4] {
        [self.p0, self.p1, self.p2, self.p3]
    }

    /// Evaluates the point and tangent at `u`.
    ///
    /// `u` is not clamped: values outside `[0, 1]` extrapolate the polynomial.
    #[must_use]
    pub fn evaluate(&self, u: f64) -> CurveSample {
        let uc = 1.0 - u;

        // First level: split the three control-polygon legs.
        let a = self.p0.blend(self.p1, uc, u);
        let b = self.p1.blend(self.p2, uc, u);
        let c = self.p2.blend(self.p3, uc, u);

        // Second level: the segment DE is tangent to the curve at u.
        let d = a.blend(b, uc, u);
        let e = b.blend(c, uc, u);

        CurveSample {
            point: d.blend(e, uc, u),
            tangent: e.sub_point(d).mul_scalar(3.0),
        }
    }

    #[must_use]
    pub fn point_at(&self, u: f64) -> Point3 {
        self.evaluate(u).point
    }

    #[must_use]
    pub fn derivative_at(&self, u: f64) -> Vec3 {
        self.evaluate(u).tangent
    }

    /// Same curve traversed from `p3` to `p0`.
    #[must_use]
    pub const fn reversed(&self) -> Self {
        Self::new(self.p3, self.p2, self.p1, self.p0)
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.control_points().iter().all(|p| p.is_finite())
    }
}
