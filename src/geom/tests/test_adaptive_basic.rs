use super::{SphereOctant, dome_grid, planar_grid};
use crate::geom::{
    BezierPatch, ParamVertex, Point3, Primitive, PrimitiveMode, ShadingMode, Surface,
    TessellationStats, Tolerance, Vec3, tessellate_patch_adaptive, tessellate_triangle_adaptive,
};

fn adaptive(
    surface: &impl Surface,
    tolerance: f64,
    max_depth: usize,
) -> (Vec<Primitive>, TessellationStats) {
    let mut out = Vec::new();
    let stats = tessellate_patch_adaptive(
        surface,
        tolerance,
        max_depth,
        PrimitiveMode::Filled,
        ShadingMode::Smooth,
        &mut out,
    )
    .expect("valid settings");
    (out, stats)
}

#[test]
fn flat_patch_terminates_at_depth_zero() {
    let patch = BezierPatch::from_control_grid(planar_grid());
    let (out, stats) = adaptive(&patch, 1e-9, 8);

    assert_eq!(out.len(), 2);
    assert_eq!(stats.max_depth_reached, 0);
    assert_eq!(stats.subdivisions, 0);
    for primitive in &out {
        let Primitive::Triangle(vertices) = primitive else {
            panic!("expected triangles");
        };
        for v in vertices {
            assert!(Tolerance::DEFAULT.approx_eq_vec3(v.normal, Vec3::Z));
        }
    }
}

#[test]
fn initial_split_uses_the_one_zero_diagonal() {
    let grid = dome_grid();
    let patch = BezierPatch::from_control_grid(grid);
    let (out, _) = adaptive(&patch, f64::INFINITY, 5);

    let positions: Vec<[Point3; 3]> = out
        .iter()
        .map(|p| match p {
            Primitive::Triangle(v) => v.map(|v| v.position),
            Primitive::Line(_) => panic!("expected triangles"),
        })
        .collect();
    assert_eq!(
        positions,
        vec![
            [grid[0][0], grid[0][3], grid[3][0]],
            [grid[0][3], grid[3][3], grid[3][0]],
        ]
    );
}

#[test]
fn depth_ceiling_is_respected() {
    let patch = BezierPatch::from_control_grid(dome_grid());
    for max_depth in 1..=6 {
        let (out, stats) = adaptive(&patch, 1e-12, max_depth);
        assert!(stats.max_depth_reached <= max_depth);
        assert!(out.len() <= 2 * 4_usize.pow(max_depth as u32));
        assert_eq!(out.len(), stats.triangles);
    }
}

#[test]
fn tighter_tolerance_refines_further() {
    let patch = BezierPatch::from_control_grid(dome_grid());
    let (coarse, coarse_stats) = adaptive(&patch, 1.0, 10);
    let (fine, fine_stats) = adaptive(&patch, 0.01, 10);

    assert!(coarse.len() > 2);
    assert!(fine.len() > coarse.len());
    assert!(fine_stats.max_depth_reached > coarse_stats.max_depth_reached);
    assert_eq!(fine_stats.depth_limit_hits, 0);
}

#[test]
fn emitted_vertices_lie_inside_the_control_hull() {
    let patch = BezierPatch::from_control_grid(dome_grid());
    let tolerance = 0.05;
    let (out, stats) = adaptive(&patch, tolerance, 12);
    assert_eq!(stats.depth_limit_hits, 0);

    // Every emitted vertex lies on the surface, so it lies inside the control hull.
    let bounds = patch.bounds();
    for primitive in &out {
        let Primitive::Triangle(vertices) = primitive else {
            panic!("expected triangles");
        };
        for v in vertices {
            let p = v.position;
            assert!(p.x >= bounds.min.x - 1e-12 && p.x <= bounds.max.x + 1e-12);
            assert!(p.y >= bounds.min.y - 1e-12 && p.y <= bounds.max.y + 1e-12);
            assert!(p.z >= bounds.min.z - 1e-12 && p.z <= bounds.max.z + 1e-12);
        }
    }
}

#[test]
fn infinite_tolerance_keeps_the_two_initial_triangles() {
    let patch = BezierPatch::from_control_grid(dome_grid());
    let (out, stats) = adaptive(&patch, f64::INFINITY, 20);
    assert_eq!(out.len(), 2);
    assert_eq!(stats.max_depth_reached, 0);
    assert_eq!(stats.surface_evaluations, 4 + 6);
}

#[test]
fn max_depth_zero_emits_input_triangle() {
    let patch = BezierPatch::from_control_grid(dome_grid());
    let corner = |u: f64, v: f64| ParamVertex::from_sample(u, v, &patch.evaluate(u, v));
    let triangle = [corner(0.0, 0.0), corner(1.0, 0.0), corner(0.0, 1.0)];

    let mut out: Vec<Primitive> = Vec::new();
    tessellate_triangle_adaptive(
        &patch,
        triangle,
        1e-6,
        0,
        PrimitiveMode::Filled,
        ShadingMode::Smooth,
        &mut out,
    )
    .expect("valid settings");
    assert_eq!(out, vec![Primitive::Triangle(triangle.map(|p| p.vertex()))]);
}

#[test]
fn repeated_runs_are_bit_identical() {
    let patch = BezierPatch::from_control_grid(dome_grid());
    let (first, first_stats) = adaptive(&patch, 0.01, 8);
    let (second, second_stats) = adaptive(&patch, 0.01, 8);
    assert_eq!(first, second);
    assert_eq!(first_stats, second_stats);
}

#[test]
fn wireframe_emits_three_lines_per_triangle() {
    let patch = BezierPatch::from_control_grid(dome_grid());
    let mut out: Vec<Primitive> = Vec::new();
    let stats = tessellate_patch_adaptive(
        &patch,
        0.05,
        6,
        PrimitiveMode::Wireframe,
        ShadingMode::Flat,
        &mut out,
    )
    .expect("valid settings");

    assert_eq!(out.len(), 3 * stats.triangles);
    assert!(out.iter().all(|p| matches!(p, Primitive::Line(_))));
}

#[test]
fn sphere_octant_vertices_stay_on_the_sphere() {
    let radius = 3.0;
    let octant = SphereOctant { radius };
    let (out, stats) = adaptive(&octant, 1e-3, 10);

    assert!(stats.subdivisions > 0);
    assert_eq!(stats.depth_limit_hits, 0);
    for primitive in &out {
        let Primitive::Triangle(vertices) = primitive else {
            panic!("expected triangles");
        };
        for v in vertices {
            let r = v.position.sub_point(Point3::ORIGIN).length();
            assert!((r - radius).abs() < 1e-12);
            assert!((v.normal.length() - 1.0).abs() < 1e-9);
        }
    }
}

#[test]
fn degenerate_corner_normals_stay_finite() {
    let mut grid = dome_grid();
    grid[0] = [Point3::new(1.5, 0.0, 0.0); 4];
    let patch = BezierPatch::from_control_grid(grid);
    let (out, stats) = adaptive(&patch, 0.05, 8);

    assert!(stats.degenerate_normals > 0);
    for primitive in &out {
        let Primitive::Triangle(vertices) = primitive else {
            panic!("expected triangles");
        };
        for v in vertices {
            assert!(v.normal.is_finite());
            assert!((v.normal.length() - 1.0).abs() < 1e-9);
        }
    }
}
