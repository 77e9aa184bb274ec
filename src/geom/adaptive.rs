//! Adaptive triangle refinement driven by an edge-midpoint flatness test.
//!
//! Each triangle lives in the `(u, v)` parameter domain of a surface. For
//! every edge the surface point at the parametric midpoint is compared with
//! the straight-line midpoint of the edge's two surface points. Edges whose
//! deviation is below the tolerance are flat. A triangle with only flat
//! edges (or no depth budget left) is emitted; otherwise it is split along
//! the failing edges, using the surface midpoints as new vertices.
//!
//! The split pattern depends only on which edges failed, so the 3-bit
//! failure code indexes a fixed table of sub-triangles:
//!
//! | failing edges | sub-triangles |
//! |---------------|---------------|
//! | one           | 2             |
//! | two           | 3             |
//! | all three     | 4 (three corners plus the centre) |
//!
//! Sub-triangles keep the winding of their parent.

use super::core::{Point3, Vec3};
use super::mesh::{GeometrySink, Vertex};
use super::surface::{Surface, SurfaceSample};
use super::tessellation::{
    PrimitiveMode, ShadingMode, TessellationError, TessellationStats, emit_triangle,
    validate_tolerance,
};

/// A triangle corner: parameters plus the surface point and normal there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamVertex {
    pub u: f64,
    pub v: f64,
    pub point: Point3,
    pub normal: Vec3,
}

impl ParamVertex {
    #[must_use]
    pub const fn from_sample(u: f64, v: f64, sample: &SurfaceSample) -> Self {
        Self {
            u,
            v,
            point: sample.point,
            normal: sample.normal,
        }
    }

    #[must_use]
    pub const fn vertex(&self) -> Vertex {
        Vertex::new(self.point, self.normal)
    }
}

/// Which of the three edges (`v0v1`, `v1v2`, `v2v0`) failed the flatness test;
/// bit `i` is set when edge `i` failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeFailures(u8);

impl EdgeFailures {
    #[must_use]
    pub const fn from_flags(flags: [bool; 3]) -> Self {
        Self(flags[0] as u8 | (flags[1] as u8) << 1 | (flags[2] as u8) << 2)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn all_flat(self) -> bool {
        self.0 == 0
    }

    /// Sub-triangles for this outcome, as indices into the slot array
    /// `[v0, v1, v2, m01, m12, m20]`.
    ///
    /// Tables for codes that differ by a rotation of the corners are the
    /// same pattern rotated.
    #[must_use]
    pub const fn split_table(self) -> &'static [[usize; 3]] {
        match self.0 {
            0b001 => &[[0, 3, 2], [3, 1, 2]],
            0b010 => &[[1, 4, 0], [4, 2, 0]],
            0b100 => &[[2, 5, 1], [5, 0, 1]],
            0b011 => &[[3, 1, 4], [0, 3, 4], [0, 4, 2]],
            0b110 => &[[4, 2, 5], [1, 4, 5], [1, 5, 0]],
            0b101 => &[[5, 0, 3], [2, 5, 3], [2, 3, 1]],
            0b111 => &[[0, 3, 5], [3, 1, 4], [5, 4, 2], [3, 4, 5]],
            _ => &[],
        }
    }
}

/// Refines one parameter-space triangle of `surface` and emits the result.
///
/// `max_depth` bounds the number of split levels; `0` emits `triangle`
/// unchanged. An edge is flat only when its deviation is strictly below
/// `tolerance`, which must be positive (`f64::INFINITY` never splits).
pub fn tessellate_triangle_adaptive<S, K>(
    surface: &S,
    triangle: [ParamVertex; 3],
    tolerance: f64,
    max_depth: usize,
    primitives: PrimitiveMode,
    shading: ShadingMode,
    sink: &mut K,
) -> Result<TessellationStats, TessellationError>
where
    S: Surface + ?Sized,
    K: GeometrySink + ?Sized,
{
    validate_tolerance(tolerance)?;

    let mut refiner = Refiner {
        surface,
        tolerance,
        max_depth,
        primitives,
        shading,
        sink,
        stats: TessellationStats::default(),
    };
    refiner.run(triangle);
    Ok(refiner.stats)
}

/// Adaptively tessellates the whole unit parameter square of `surface`.
///
/// The square is split along its `(1,0)–(0,1)` diagonal into two triangles,
/// each refined with [`tessellate_triangle_adaptive`].
pub fn tessellate_patch_adaptive<S, K>(
    surface: &S,
    tolerance: f64,
    max_depth: usize,
    primitives: PrimitiveMode,
    shading: ShadingMode,
    sink: &mut K,
) -> Result<TessellationStats, TessellationError>
where
    S: Surface + ?Sized,
    K: GeometrySink + ?Sized,
{
    validate_tolerance(tolerance)?;

    let mut stats = TessellationStats::default();
    let mut corner = |u: f64, v: f64| {
        let sample = surface.evaluate(u, v);
        stats.record_sample(&sample);
        ParamVertex::from_sample(u, v, &sample)
    };
    let c00 = corner(0.0, 0.0);
    let c10 = corner(1.0, 0.0);
    let c01 = corner(0.0, 1.0);
    let c11 = corner(1.0, 1.0);

    for triangle in [[c00, c10, c01], [c10, c11, c01]] {
        let half = tessellate_triangle_adaptive(
            surface, triangle, tolerance, max_depth, primitives, shading, sink,
        )?;
        stats.merge(&half);
    }

    log::debug!(
        "adaptive tessellation: tolerance={tolerance}, triangles={}, subdivisions={}, depth={}/{max_depth}",
        stats.triangles,
        stats.subdivisions,
        stats.max_depth_reached
    );
    Ok(stats)
}

struct Refiner<'a, S: ?Sized, K: ?Sized> {
    surface: &'a S,
    tolerance: f64,
    max_depth: usize,
    primitives: PrimitiveMode,
    shading: ShadingMode,
    sink: &'a mut K,
    stats: TessellationStats,
}

impl<S, K> Refiner<'_, S, K>
where
    S: Surface + ?Sized,
    K: GeometrySink + ?Sized,
{
    /// Depth-first refinement on an explicit stack, so a large depth budget
    /// cannot overflow the call stack. Children are pushed in reverse so they
    /// are emitted in table order.
    fn run(&mut self, root: [ParamVertex; 3]) {
        let mut stack = vec![(root, 0_usize)];

        while let Some((triangle, depth)) = stack.pop() {
            if depth >= self.max_depth {
                self.emit(&triangle, depth);
                self.stats.depth_limit_hits += 1;
                continue;
            }

            let midpoints = [
                self.edge_midpoint(triangle[0], triangle[1]),
                self.edge_midpoint(triangle[1], triangle[2]),
                self.edge_midpoint(triangle[2], triangle[0]),
            ];
            let failures = EdgeFailures::from_flags(midpoints.map(|(_, deviation)| {
                // Equality still needs subdivision.
                !(deviation < self.tolerance)
            }));

            if failures.all_flat() {
                self.emit(&triangle, depth);
                continue;
            }

            self.stats.subdivisions += 1;
            let [a, b, c] = triangle;
            let slots = [a, b, c, midpoints[0].0, midpoints[1].0, midpoints[2].0];
            for corners in failures.split_table().iter().rev() {
                let child = corners.map(|slot| slots[slot]);
                stack.push((child, depth + 1));
            }
        }
    }

    /// Surface point at the parametric midpoint of `a`–`b` and its distance
    /// from the chord midpoint.
    fn edge_midpoint(&mut self, a: ParamVertex, b: ParamVertex) -> (ParamVertex, f64) {
        let u = 0.5 * (a.u + b.u);
        let v = 0.5 * (a.v + b.v);
        let sample = self.surface.evaluate(u, v);
        self.stats.record_sample(&sample);

        let deviation = sample.point.distance_to(a.point.midpoint(b.point));
        (ParamVertex::from_sample(u, v, &sample), deviation)
    }

    fn emit(&mut self, triangle: &[ParamVertex; 3], depth: usize) {
        emit_triangle(
            self.sink,
            triangle.map(|p| p.vertex()),
            self.primitives,
            self.shading,
        );
        self.stats.triangles += 1;
        self.stats.max_depth_reached = self.stats.max_depth_reached.max(depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::mesh::Primitive;

    /// Paraboloid `z = u² + v²`; curved along every edge direction.
    struct Bowl;

    impl Surface for Bowl {
        fn frame_at(&self, u: f64, v: f64) -> (Point3, Vec3, Vec3) {
            (
                Point3::new(u, v, u * u + v * v),
                Vec3::new(1.0, 0.0, 2.0 * u),
                Vec3::new(0.0, 1.0, 2.0 * v),
            )
        }
    }

    fn corner(u: f64, v: f64) -> ParamVertex {
        ParamVertex::from_sample(u, v, &Bowl.evaluate(u, v))
    }

    fn unit_triangle() -> [ParamVertex; 3] {
        [corner(0.0, 0.0), corner(1.0, 0.0), corner(0.0, 1.0)]
    }

    #[test]
    fn split_tables_cover_every_failure_code() {
        let expected_counts = [0, 2, 2, 3, 2, 3, 3, 4];
        for bits in 0_u8..8 {
            let flags = [bits & 1 != 0, bits & 2 != 0, bits & 4 != 0];
            let failures = EdgeFailures::from_flags(flags);
            assert_eq!(failures.bits(), bits);
            let table = failures.split_table();
            assert_eq!(table.len(), expected_counts[bits as usize]);

            // Every failing edge's midpoint is used, no passing edge's is.
            for edge in 0..3 {
                let used = table.iter().flatten().any(|&slot| slot == 3 + edge);
                assert_eq!(used, flags[edge], "code {bits:03b}, edge {edge}");
            }
        }
    }

    #[test]
    fn split_tables_preserve_area_and_winding() {
        // Slot positions for a reference triangle in the plane.
        let slots = [
            (0.0, 0.0),
            (4.0, 0.0),
            (0.0, 4.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (0.0, 2.0),
        ];
        let signed_area = |t: [usize; 3]| {
            let (ax, ay) = slots[t[0]];
            let (bx, by) = slots[t[1]];
            let (cx, cy) = slots[t[2]];
            0.5 * ((bx - ax) * (cy - ay) - (cx - ax) * (by - ay))
        };

        for bits in 1_u8..8 {
            let table = EdgeFailures(bits).split_table();
            let mut total: f64 = 0.0;
            for &tri in table {
                let area = signed_area(tri);
                assert!(area > 0.0, "code {bits:03b} flips {tri:?}");
                total += area;
            }
            assert!((total - 8.0).abs() < 1e-12, "code {bits:03b} covers {total}");
        }
    }

    #[test]
    fn zero_depth_emits_input_unmodified() {
        let triangle = unit_triangle();
        let mut out: Vec<Primitive> = Vec::new();
        let stats = tessellate_triangle_adaptive(
            &Bowl,
            triangle,
            1e-6,
            0,
            PrimitiveMode::Filled,
            ShadingMode::Smooth,
            &mut out,
        )
        .unwrap();

        assert_eq!(out, vec![Primitive::Triangle(triangle.map(|p| p.vertex()))]);
        assert_eq!(stats.triangles, 1);
        assert_eq!(stats.surface_evaluations, 0);
        assert_eq!(stats.max_depth_reached, 0);
    }

    #[test]
    fn infinite_tolerance_never_splits() {
        let mut out: Vec<Primitive> = Vec::new();
        let stats = tessellate_triangle_adaptive(
            &Bowl,
            unit_triangle(),
            f64::INFINITY,
            12,
            PrimitiveMode::Filled,
            ShadingMode::Smooth,
            &mut out,
        )
        .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(stats.subdivisions, 0);
        assert_eq!(stats.max_depth_reached, 0);
        assert_eq!(stats.depth_limit_hits, 0);
    }

    #[test]
    fn depth_budget_is_never_exceeded() {
        for max_depth in 1..=5 {
            let mut out: Vec<Primitive> = Vec::new();
            let stats = tessellate_triangle_adaptive(
                &Bowl,
                unit_triangle(),
                1e-9,
                max_depth,
                PrimitiveMode::Filled,
                ShadingMode::Smooth,
                &mut out,
            )
            .unwrap();

            assert_eq!(stats.max_depth_reached, max_depth);
            assert!(stats.depth_limit_hits > 0);
            // A curved triangle with a tiny tolerance always takes the 4-way split.
            assert_eq!(out.len(), 4_usize.pow(max_depth as u32));
            assert_eq!(stats.triangles, out.len());
        }
    }

    #[test]
    fn tolerance_equal_to_deviation_still_splits() {
        // The hypotenuse (1,0)-(0,1) deviates by exactly 0.5: chord midpoint
        // z = 1, surface z = 0.5. The legs deviate by 0.25.
        let triangle = unit_triangle();
        let mut out: Vec<Primitive> = Vec::new();
        let stats = tessellate_triangle_adaptive(
            &Bowl,
            triangle,
            0.5,
            1,
            PrimitiveMode::Filled,
            ShadingMode::Smooth,
            &mut out,
        )
        .unwrap();
        assert_eq!(stats.subdivisions, 1);
        assert_eq!(out.len(), 2);

        let mut out: Vec<Primitive> = Vec::new();
        let stats = tessellate_triangle_adaptive(
            &Bowl,
            triangle,
            0.500_001,
            1,
            PrimitiveMode::Filled,
            ShadingMode::Smooth,
            &mut out,
        )
        .unwrap();
        assert_eq!(stats.subdivisions, 0);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn single_failing_edge_splits_in_two() {
        // Sags only along the v = 0 boundary.
        struct Gutter;
        impl Surface for Gutter {
            fn frame_at(&self, u: f64, v: f64) -> (Point3, Vec3, Vec3) {
                let z = if v == 0.0 { u * u - u } else { 0.0 };
                (Point3::new(u, v, z), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0))
            }
        }

        let corner = |u: f64, v: f64| ParamVertex::from_sample(u, v, &Gutter.evaluate(u, v));
        let triangle = [corner(0.0, 0.0), corner(1.0, 0.0), corner(0.0, 1.0)];

        let mut out: Vec<Primitive> = Vec::new();
        let stats = tessellate_triangle_adaptive(
            &Gutter,
            triangle,
            0.1,
            1,
            PrimitiveMode::Filled,
            ShadingMode::Smooth,
            &mut out,
        )
        .unwrap();

        assert_eq!(stats.subdivisions, 1);
        assert_eq!(out.len(), 2);
        let Primitive::Triangle(first) = out[0] else {
            panic!("expected a triangle");
        };
        assert_eq!(first[1].position, Point3::new(0.5, 0.0, -0.25));
    }

    #[test]
    fn rejects_non_positive_tolerance() {
        let mut out: Vec<Primitive> = Vec::new();
        for tolerance in [0.0, -1.0, f64::NAN] {
            let result = tessellate_triangle_adaptive(
                &Bowl,
                unit_triangle(),
                tolerance,
                3,
                PrimitiveMode::Filled,
                ShadingMode::Smooth,
                &mut out,
            );
            assert!(matches!(result, Err(TessellationError::InvalidTolerance(_))));
        }
        assert!(out.is_empty());
    }
}
