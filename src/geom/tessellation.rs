//! Tessellation configuration and uniform grid tessellation of surfaces.
//!
//! A surface is turned into primitives in one of two ways:
//!
//! - **Uniform**: sample a regular `(step + 1) × (step + 1)` grid over the unit
//!   parameter square and emit two triangles per cell ([`tessellate_uniform`]).
//! - **Adaptive**: split the parameter square into two triangles and refine
//!   each one where its edges deviate from the surface
//!   ([`super::adaptive::tessellate_patch_adaptive`]).
//!
//! Both emit into a [`GeometrySink`] and honour the same presentation flags:
//! [`PrimitiveMode`] (filled triangles or wireframe lines) and [`ShadingMode`]
//! (per-vertex surface normals or one face normal per triangle).
//!
//! ```ignore
//! use bez_engine::geom::{GeomMesh, TessellationConfig, tessellate_patch};
//!
//! let config = TessellationConfig::adaptive(0.01, 8).with_wireframe(true);
//! let mut mesh = GeomMesh::new();
//! let stats = tessellate_patch(&patch, &config, &mut mesh)?;
//! ```

use serde::{Deserialize, Serialize};

use super::adaptive::tessellate_patch_adaptive;
use super::core::{Point3, Vec3};
use super::mesh::{GeometrySink, Primitive, Vertex};
use super::surface::{Surface, SurfaceSample};

/// Uniform step used when nothing else is configured.
pub const DEFAULT_STEP: usize = 16;

/// Adaptive depth above which a warning is logged; output can grow as `4^depth`.
pub const DEEP_RECURSION_WARNING: usize = 20;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TessellationError {
    #[error("uniform step must be at least 1")]
    InvalidStep,
    #[error("adaptive tolerance must be > 0, got {0}")]
    InvalidTolerance(f64),
    #[error("adaptive recursion depth must be at least 1")]
    InvalidDepth,
}

/// How the parameter domain is subdivided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TessellationMode {
    /// Regular grid with `step` cells along each parameter direction.
    Uniform { step: usize },
    /// Recursive refinement until every edge midpoint is within `tolerance`
    /// of the surface, or `max_depth` levels have been used.
    Adaptive { tolerance: f64, max_depth: usize },
}

impl Default for TessellationMode {
    fn default() -> Self {
        Self::Uniform { step: DEFAULT_STEP }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveMode {
    /// Filled triangles.
    #[default]
    Filled,
    /// The three edges of every triangle as line segments.
    Wireframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadingMode {
    /// Each vertex carries the surface normal at its parameters.
    #[default]
    Smooth,
    /// All vertices of a triangle carry the triangle's face normal.
    Flat,
}

/// Immutable settings for one tessellation pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationConfig {
    pub mode: TessellationMode,
    pub primitives: PrimitiveMode,
    pub shading: ShadingMode,
}

impl TessellationConfig {
    #[must_use]
    pub fn uniform(step: usize) -> Self {
        Self {
            mode: TessellationMode::Uniform { step },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn adaptive(tolerance: f64, max_depth: usize) -> Self {
        Self {
            mode: TessellationMode::Adaptive {
                tolerance,
                max_depth,
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.primitives = if wireframe {
            PrimitiveMode::Wireframe
        } else {
            PrimitiveMode::Filled
        };
        self
    }

    #[must_use]
    pub fn with_flat_shading(mut self, flat: bool) -> Self {
        self.shading = if flat {
            ShadingMode::Flat
        } else {
            ShadingMode::Smooth
        };
        self
    }

    #[must_use]
    pub fn is_adaptive(&self) -> bool {
        matches!(self.mode, TessellationMode::Adaptive { .. })
    }

    /// Rejects settings that cannot produce a mesh. Called before any
    /// surface is evaluated.
    pub fn validate(&self) -> Result<(), TessellationError> {
        match self.mode {
            TessellationMode::Uniform { step } => validate_step(step),
            TessellationMode::Adaptive {
                tolerance,
                max_depth,
            } => {
                validate_tolerance(tolerance)?;
                if max_depth == 0 {
                    return Err(TessellationError::InvalidDepth);
                }
                if max_depth > DEEP_RECURSION_WARNING {
                    log::warn!(
                        "adaptive max depth {max_depth} allows up to 4^{max_depth} triangles per patch half"
                    );
                }
                Ok(())
            }
        }
    }
}

pub(crate) fn validate_step(step: usize) -> Result<(), TessellationError> {
    if step == 0 {
        return Err(TessellationError::InvalidStep);
    }
    Ok(())
}

pub(crate) fn validate_tolerance(tolerance: f64) -> Result<(), TessellationError> {
    // Also rejects NaN; +inf is allowed and simply never subdivides.
    if !(tolerance > 0.0) {
        return Err(TessellationError::InvalidTolerance(tolerance));
    }
    Ok(())
}

/// Counters collected while tessellating one or more surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TessellationStats {
    /// Triangles produced (emitted as a face or as three wireframe lines).
    pub triangles: usize,
    pub surface_evaluations: usize,
    /// Samples whose normal needed the degenerate-normal fallback.
    pub degenerate_normals: usize,
    /// Adaptive splits performed.
    pub subdivisions: usize,
    /// Deepest adaptive level at which a triangle was emitted.
    pub max_depth_reached: usize,
    /// Adaptive triangles emitted only because the depth budget ran out.
    pub depth_limit_hits: usize,
}

impl TessellationStats {
    pub fn merge(&mut self, other: &Self) {
        self.triangles += other.triangles;
        self.surface_evaluations += other.surface_evaluations;
        self.degenerate_normals += other.degenerate_normals;
        self.subdivisions += other.subdivisions;
        self.max_depth_reached = self.max_depth_reached.max(other.max_depth_reached);
        self.depth_limit_hits += other.depth_limit_hits;
    }

    pub(crate) fn record_sample(&mut self, sample: &SurfaceSample) {
        self.surface_evaluations += 1;
        if sample.degenerate_normal {
            self.degenerate_normals += 1;
        }
    }
}

/// Tessellates one surface according to `config`.
///
/// The configuration is validated before the surface is touched.
pub fn tessellate_patch<S, K>(
    surface: &S,
    config: &TessellationConfig,
    sink: &mut K,
) -> Result<TessellationStats, TessellationError>
where
    S: Surface + ?Sized,
    K: GeometrySink + ?Sized,
{
    config.validate()?;
    tessellate_validated(surface, config, sink)
}

/// [`tessellate_patch`] without re-validating; for drivers that validated
/// `config` once up front.
pub(crate) fn tessellate_validated<S, K>(
    surface: &S,
    config: &TessellationConfig,
    sink: &mut K,
) -> Result<TessellationStats, TessellationError>
where
    S: Surface + ?Sized,
    K: GeometrySink + ?Sized,
{
    match config.mode {
        TessellationMode::Uniform { step } => {
            tessellate_uniform(surface, step, config.primitives, config.shading, sink)
        }
        TessellationMode::Adaptive {
            tolerance,
            max_depth,
        } => tessellate_patch_adaptive(
            surface,
            tolerance,
            max_depth,
            config.primitives,
            config.shading,
            sink,
        ),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Uniform grid
// ─────────────────────────────────────────────────────────────────────────────

/// One evaluated grid point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSample {
    pub u: f64,
    pub v: f64,
    pub point: Point3,
    pub normal: Vec3,
    pub degenerate_normal: bool,
}

impl GridSample {
    #[must_use]
    pub const fn vertex(&self) -> Vertex {
        Vertex::new(self.point, self.normal)
    }
}

/// Samples of a surface on a regular parameter grid.
///
/// Indexed `(row, col)` = `(v index, u index)`, each in `0..=step`, stored
/// row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceGrid {
    step: usize,
    samples: Vec<GridSample>,
}

impl SurfaceGrid {
    #[must_use]
    pub const fn step(&self) -> usize {
        self.step
    }

    /// Points per side (`step + 1`).
    #[must_use]
    pub const fn side(&self) -> usize {
        self.step + 1
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.step * self.step
    }

    /// # Panics
    /// Panics if `row` or `col` exceeds `step`.
    #[must_use]
    pub fn at(&self, row: usize, col: usize) -> &GridSample {
        assert!(row <= self.step && col <= self.step, "grid index out of range");
        &self.samples[row * self.side() + col]
    }

    #[must_use]
    pub fn samples(&self) -> &[GridSample] {
        &self.samples
    }
}

/// Parameter value of grid line `index` out of `step`.
///
/// Computed from the index rather than accumulated, and pinned to exactly
/// 1.0 on the last line so the far boundary is never missed or overshot.
#[must_use]
pub fn grid_parameter(index: usize, step: usize) -> f64 {
    if index >= step {
        1.0
    } else {
        index as f64 / step as f64
    }
}

/// Evaluates `surface` on a `(step + 1) × (step + 1)` grid.
pub fn sample_surface_grid<S>(surface: &S, step: usize) -> Result<SurfaceGrid, TessellationError>
where
    S: Surface + ?Sized,
{
    validate_step(step)?;

    let side = step + 1;
    let mut samples = Vec::with_capacity(side * side);
    for row in 0..side {
        let v = grid_parameter(row, step);
        for col in 0..side {
            let u = grid_parameter(col, step);
            let sample = surface.evaluate(u, v);
            samples.push(GridSample {
                u,
                v,
                point: sample.point,
                normal: sample.normal,
                degenerate_normal: sample.degenerate_normal,
            });
        }
    }

    Ok(SurfaceGrid { step, samples })
}

/// Tessellates `surface` on a uniform grid and emits two triangles per cell.
///
/// For cell `(k, r)` the triangles are `(k,r) → (k,r+1) → (k+1,r)` and
/// `(k,r+1) → (k+1,r+1) → (k+1,r)`: counter-clockwise in `(u, v)`, so faces
/// point along dP/du × dP/dv.
pub fn tessellate_uniform<S, K>(
    surface: &S,
    step: usize,
    primitives: PrimitiveMode,
    shading: ShadingMode,
    sink: &mut K,
) -> Result<TessellationStats, TessellationError>
where
    S: Surface + ?Sized,
    K: GeometrySink + ?Sized,
{
    let grid = sample_surface_grid(surface, step)?;

    let mut stats = TessellationStats::default();
    stats.surface_evaluations = grid.point_count();
    stats.degenerate_normals = grid
        .samples()
        .iter()
        .filter(|s| s.degenerate_normal)
        .count();

    for k in 0..step {
        for r in 0..step {
            let p00 = grid.at(k, r).vertex();
            let p01 = grid.at(k, r + 1).vertex();
            let p10 = grid.at(k + 1, r).vertex();
            let p11 = grid.at(k + 1, r + 1).vertex();

            emit_triangle(sink, [p00, p01, p10], primitives, shading);
            emit_triangle(sink, [p01, p11, p10], primitives, shading);
            stats.triangles += 2;
        }
    }

    log::debug!(
        "uniform tessellation: step={step}, triangles={}, degenerate normals={}",
        stats.triangles,
        stats.degenerate_normals
    );
    Ok(stats)
}

// ─────────────────────────────────────────────────────────────────────────────
// Emission
// ─────────────────────────────────────────────────────────────────────────────

/// Emits one triangle honouring the presentation flags.
pub(crate) fn emit_triangle<K>(
    sink: &mut K,
    vertices: [Vertex; 3],
    primitives: PrimitiveMode,
    shading: ShadingMode,
) where
    K: GeometrySink + ?Sized,
{
    let vertices = match shading {
        ShadingMode::Smooth => vertices,
        ShadingMode::Flat => {
            let normal = face_normal(&vertices);
            vertices.map(|v| Vertex::new(v.position, normal))
        }
    };

    match primitives {
        PrimitiveMode::Filled => sink.emit(Primitive::Triangle(vertices)),
        PrimitiveMode::Wireframe => {
            let [a, b, c] = vertices;
            sink.emit(Primitive::Line([a, b]));
            sink.emit(Primitive::Line([b, c]));
            sink.emit(Primitive::Line([c, a]));
        }
    }
}

/// Geometric normal of a triangle; zero-area triangles use the average of
/// their vertex normals instead.
pub(crate) fn face_normal(vertices: &[Vertex; 3]) -> Vec3 {
    let [a, b, c] = vertices;
    let geometric = (b.position - a.position).cross(c.position - a.position);
    geometric
        .normalized()
        .or_else(|| (a.normal + b.normal + c.normal).normalized())
        .unwrap_or(Vec3::Z)
}
