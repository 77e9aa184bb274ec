//! Bicubic Bézier patches and the ordered collection they are processed in.

use super::core::{BBox, Point3, Vec3};
use super::curve::CubicBezier3;
use super::surface::Surface;

/// A 4×4 control grid, indexed `grid[row][col]`.
pub type ControlGrid = [[Point3; 4]; 4];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatchError {
    #[error("control point ({row}, {col}) differs between curve v{col} and curve u{row}")]
    InconsistentControlPoint { row: usize, col: usize },
    #[error("control point ({row}, {col}) is not finite")]
    NonFiniteControlPoint { row: usize, col: usize },
}

/// A bicubic tensor-product Bézier patch stored as its 8 boundary/interior curves.
///
/// `u_curves[row]` runs along a grid row and is parameterized by `u`;
/// `v_curves[col]` runs down a grid column and is parameterized by `v`.
/// Both sets describe the same 16 control points: `v_curves[col]` control
/// point `row` equals `u_curves[row]` control point `col`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierPatch {
    v_curves: [CubicBezier3; 4],
    u_curves: [CubicBezier3; 4],
}

impl BezierPatch {
    /// Builds the patch from its control grid. Both curve families are derived
    /// from the same grid, so they always agree.
    #[must_use]
    pub fn from_control_grid(grid: ControlGrid) -> Self {
        let u_curves = grid.map(CubicBezier3::from_array);
        let v_curves = std::array::from_fn(|col| {
            CubicBezier3::new(grid[0][col], grid[1][col], grid[2][col], grid[3][col])
        });
        Self { v_curves, u_curves }
    }

    /// Like [`from_control_grid`](Self::from_control_grid) but rejects NaN/Inf coordinates.
    pub fn try_from_control_grid(grid: ControlGrid) -> Result<Self, PatchError> {
        for (row, points) in grid.iter().enumerate() {
            for (col, p) in points.iter().enumerate() {
                if !p.is_finite() {
                    return Err(PatchError::NonFiniteControlPoint { row, col });
                }
            }
        }
        Ok(Self::from_control_grid(grid))
    }

    /// Builds the patch from independently supplied curves, checking that they
    /// share one control grid.
    pub fn from_curves(
        v_curves: [CubicBezier3; 4],
        u_curves: [CubicBezier3; 4],
    ) -> Result<Self, PatchError> {
        for (row, u_curve) in u_curves.iter().enumerate() {
            for (col, v_curve) in v_curves.iter().enumerate() {
                let from_u = u_curve.control_points()[col];
                let from_v = v_curve.control_points()[row];
                if !from_u.is_finite() {
                    return Err(PatchError::NonFiniteControlPoint { row, col });
                }
                if from_u != from_v {
                    return Err(PatchError::InconsistentControlPoint { row, col });
                }
            }
        }
        Ok(Self { v_curves, u_curves })
    }

    #[must_use]
    pub const fn v_curves(&self) -> &[CubicBezier3; 4] {
        &self.v_curves
    }

    #[must_use]
    pub const fn u_curves(&self) -> &[CubicBezier3; 4] {
        &self.u_curves
    }

    #[must_use]
    pub fn control_grid(&self) -> ControlGrid {
        self.u_curves.map(|curve| curve.control_points())
    }

    /// Corners at `(u, v)` = (0,0), (1,0), (0,1), (1,1).
    #[must_use]
    pub fn corners(&self) -> [Point3; 4] {
        let first = self.u_curves[0];
        let last = self.u_curves[3];
        [first.p0, first.p3, last.p0, last.p3]
    }

    /// Bounding box of the control net; the surface lies inside it.
    #[must_use]
    pub fn bounds(&self) -> BBox {
        let grid = self.control_grid();
        let first = grid[0][0];
        grid.iter()
            .flatten()
            .fold(BBox::new(first, first), |bbox, p| bbox.expand_point(*p))
    }
}

impl Surface for BezierPatch {
    fn frame_at(&self, u: f64, v: f64) -> (Point3, Vec3, Vec3) {
        // Profile curve in v: each row curve evaluated at u.
        let v_profile = CubicBezier3::from_array(self.u_curves.map(|c| c.point_at(u)));
        // Profile curve in u: each column curve evaluated at v.
        let u_profile = CubicBezier3::from_array(self.v_curves.map(|c| c.point_at(v)));

        let along_v = v_profile.evaluate(v);
        let along_u = u_profile.evaluate(u);
        (along_v.point, along_u.tangent, along_v.tangent)
    }
}

/// Ordered, read-only collection of patches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchSet {
    patches: Vec<BezierPatch>,
}

impl PatchSet {
    #[must_use]
    pub fn new(patches: Vec<BezierPatch>) -> Self {
        Self { patches }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&BezierPatch> {
        self.patches.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BezierPatch> {
        self.patches.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[BezierPatch] {
        &self.patches
    }

    /// Union of the control-net bounds of every patch.
    #[must_use]
    pub fn bounds(&self) -> Option<BBox> {
        self.patches
            .iter()
            .map(BezierPatch::bounds)
            .reduce(BBox::union)
    }
}

impl From<Vec<BezierPatch>> for PatchSet {
    fn from(patches: Vec<BezierPatch>) -> Self {
        Self::new(patches)
    }
}

impl FromIterator<BezierPatch> for PatchSet {
    fn from_iter<I: IntoIterator<Item = BezierPatch>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PatchSet {
    type Item = &'a BezierPatch;
    type IntoIter = std::slice::Iter<'a, BezierPatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.patches.iter()
    }
}
