use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geom::{CubicBezier3, Point3, Tolerance, Vec3};

fn random_point(rng: &mut StdRng) -> Point3 {
    Point3::new(
        rng.random_range(-10.0..10.0),
        rng.random_range(-10.0..10.0),
        rng.random_range(-10.0..10.0),
    )
}

fn random_curve(rng: &mut StdRng) -> CubicBezier3 {
    CubicBezier3::new(
        random_point(rng),
        random_point(rng),
        random_point(rng),
        random_point(rng),
    )
}

/// Bernstein form, independent of the de Casteljau evaluation.
fn bernstein(curve: &CubicBezier3, u: f64) -> Point3 {
    let uc = 1.0 - u;
    let weights = [uc * uc * uc, 3.0 * u * uc * uc, 3.0 * u * u * uc, u * u * u];
    let mut acc = Vec3::ZERO;
    for (p, w) in curve.control_points().iter().zip(weights) {
        acc = acc + p.sub_point(Point3::ORIGIN) * w;
    }
    Point3::ORIGIN + acc
}

#[test]
fn endpoints_are_exact_control_points() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let curve = random_curve(&mut rng);
        assert_eq!(curve.point_at(0.0), curve.p0);
        assert_eq!(curve.point_at(1.0), curve.p3);
    }
}

#[test]
fn midpoint_matches_closed_form() {
    let mut rng = StdRng::seed_from_u64(11);
    let tol = Tolerance::DEFAULT;
    for _ in 0..200 {
        let curve = random_curve(&mut rng);
        let sample = curve.evaluate(0.5);

        let [p0, p1, p2, p3] = curve.control_points().map(|p| p.sub_point(Point3::ORIGIN));
        let point = Point3::ORIGIN + (p0 + 3.0 * p1 + 3.0 * p2 + p3) / 8.0;
        let tangent = (p3 + p2 - p1 - p0) * 0.75;

        assert!(tol.approx_eq_point3(sample.point, point));
        assert!(tol.approx_eq_vec3(sample.tangent, tangent));
    }
}

#[test]
fn evaluation_agrees_with_bernstein_form() {
    let mut rng = StdRng::seed_from_u64(3);
    let tol = Tolerance::DEFAULT;
    for _ in 0..200 {
        let curve = random_curve(&mut rng);
        let u = rng.random_range(0.0..=1.0);
        assert!(tol.approx_eq_point3(curve.point_at(u), bernstein(&curve, u)));
    }
}

#[test]
fn tangent_matches_finite_difference() {
    let mut rng = StdRng::seed_from_u64(5);
    let h = 1e-6;
    for _ in 0..50 {
        let curve = random_curve(&mut rng);
        let u = rng.random_range(0.1..0.9);
        let fd = curve.point_at(u + h).sub_point(curve.point_at(u - h)) / (2.0 * h);
        assert!(Tolerance::new(1e-5).approx_eq_vec3(curve.derivative_at(u), fd));
    }
}

#[test]
fn straight_control_polygon_gives_uniform_line() {
    let curve = CubicBezier3::new(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 2.0, 3.0),
        Point3::new(2.0, 4.0, 6.0),
        Point3::new(3.0, 6.0, 9.0),
    );
    for i in 0..=10 {
        let u = f64::from(i) / 10.0;
        let sample = curve.evaluate(u);
        assert!(Tolerance::DEFAULT.approx_eq_point3(sample.point, Point3::new(3.0 * u, 6.0 * u, 9.0 * u)));
        assert!(Tolerance::DEFAULT.approx_eq_vec3(sample.tangent, Vec3::new(3.0, 6.0, 9.0)));
    }
}
