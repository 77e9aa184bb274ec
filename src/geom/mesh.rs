use std::fmt::Write as _;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

use super::core::{BBox, Point3, Vec3};
use super::diagnostics::TessellationDiagnostics;
use super::metrics::{GeomMetrics, TimingBucket};
use super::patch::{BezierPatch, PatchSet};
use super::tessellation::{
    TessellationConfig, TessellationError, TessellationStats, tessellate_validated,
};

/// One emitted vertex: position plus the normal the renderer should light it with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3,
    pub normal: Vec3,
}

impl Vertex {
    #[must_use]
    pub const fn new(position: Point3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}

/// A primitive handed to a [`GeometrySink`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Triangle([Vertex; 3]),
    Line([Vertex; 2]),
}

/// Receiver of tessellation output. The tessellators only ever append.
pub trait GeometrySink {
    fn emit(&mut self, primitive: Primitive);
}

impl GeometrySink for Vec<Primitive> {
    fn emit(&mut self, primitive: Primitive) {
        self.push(primitive);
    }
}

/// Flat vertex buffers assembled from emitted primitives.
///
/// Every primitive gets its own vertices (normals differ per triangle under
/// flat shading, so vertices are not shared). `indices` is a triangle list and
/// `line_indices` a segment list over the same vertex buffers.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GeomMesh {
    pub positions: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    pub line_indices: Vec<u32>,
}

impl GeomMesh {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_indices.len() / 2
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Appends another mesh, offsetting its indices.
    ///
    /// Past the `u32` index range the offsets saturate; [`validate`](Self::validate)
    /// reports such a mesh.
    pub fn append(&mut self, other: &GeomMesh) {
        let offset = vertex_index(self.positions.len()).unwrap_or(u32::MAX);
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices
            .extend(other.indices.iter().map(|i| i.saturating_add(offset)));
        self.line_indices
            .extend(other.line_indices.iter().map(|i| i.saturating_add(offset)));
        debug_assert!(self.is_addressable(), "mesh exceeds the u32 index range");
    }

    /// Returns true if any vertex position or normal contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .chain(&self.normals)
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    /// Returns true if all triangle and line indices are within bounds.
    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len();
        self.indices
            .iter()
            .chain(&self.line_indices)
            .all(|&i| (i as usize) < n)
    }

    /// Returns true if every vertex can be referenced by a `u32` index.
    #[must_use]
    pub fn is_addressable(&self) -> bool {
        self.positions
            .len()
            .checked_sub(1)
            .is_none_or(|last| vertex_index(last).is_some())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.line_indices.len() % 2 != 0 {
            return Err("line indices are not a segment list (len % 2 != 0)".to_string());
        }
        if self.normals.len() != self.positions.len() {
            return Err("normal buffer does not match vertex count".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.is_addressable() {
            return Err("mesh has more vertices than u32 indices can address".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        Ok(())
    }

    /// Position buffer as `[x0, y0, z0, x1, ...]`.
    #[must_use]
    pub fn positions_flat(&self) -> &[f64] {
        self.positions.as_flattened()
    }

    /// Normal buffer as `[nx0, ny0, nz0, nx1, ...]`.
    #[must_use]
    pub fn normals_flat(&self) -> &[f64] {
        self.normals.as_flattened()
    }

    #[must_use]
    pub fn bounds(&self) -> Option<BBox> {
        BBox::from_points(self.positions.iter().map(|p| Point3::from(*p)))
    }

    /// Wavefront OBJ text: `v`/`vn` per vertex, `f a//a ...` per triangle and
    /// `l a b` per line.
    #[must_use]
    pub fn to_obj(&self, name: &str) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(out, "# bez-engine");
        let _ = writeln!(out, "o {name}");
        for p in &self.positions {
            let _ = writeln!(out, "v {} {} {}", p[0], p[1], p[2]);
        }
        for n in &self.normals {
            let _ = writeln!(out, "vn {} {} {}", n[0], n[1], n[2]);
        }
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
            let _ = writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}");
        }
        for seg in self.line_indices.chunks_exact(2) {
            let _ = writeln!(out, "l {} {}", seg[0] + 1, seg[1] + 1);
        }
        out
    }

    fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        let index = vertex_index(self.positions.len());
        debug_assert!(index.is_some(), "mesh exceeds the u32 index range");
        self.positions.push(vertex.position.to_array());
        self.normals.push(vertex.normal.to_array());
        index.unwrap_or(u32::MAX)
    }
}

/// Index buffer entry for the vertex stored at `position`.
fn vertex_index(position: usize) -> Option<u32> {
    u32::try_from(position).ok()
}

impl GeometrySink for GeomMesh {
    fn emit(&mut self, primitive: Primitive) {
        match primitive {
            Primitive::Triangle(vertices) => {
                for vertex in vertices {
                    let index = self.push_vertex(vertex);
                    self.indices.push(index);
                }
            }
            Primitive::Line(vertices) => {
                for vertex in vertices {
                    let index = self.push_vertex(vertex);
                    self.line_indices.push(index);
                }
            }
        }
    }
}

impl FromIterator<Primitive> for GeomMesh {
    fn from_iter<I: IntoIterator<Item = Primitive>>(iter: I) -> Self {
        let mut mesh = Self::new();
        for primitive in iter {
            mesh.emit(primitive);
        }
        mesh
    }
}

/// Per-call state shared by the meshing drivers.
#[derive(Debug, Default)]
pub struct GeomContext {
    pub metrics: GeomMetrics,
}

impl GeomContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Tessellates every patch of `patches` into one mesh.
///
/// Patches are processed independently (in parallel with the `parallel`
/// feature) and concatenated in set order, so the output does not depend on
/// scheduling. An empty set yields an empty mesh.
pub fn mesh_patches(
    patches: &PatchSet,
    config: &TessellationConfig,
) -> Result<(GeomMesh, TessellationDiagnostics), TessellationError> {
    let mut ctx = GeomContext::new();
    ctx.metrics.begin();
    mesh_patches_with_context(patches, config, &mut ctx)
}

/// Like [`mesh_patches`], charging time to `ctx.metrics`.
///
/// The metrics are not reset, so earlier phases timed on the same context
/// (parsing, typically) appear in the returned timing report.
pub fn mesh_patches_with_context(
    patches: &PatchSet,
    config: &TessellationConfig,
    ctx: &mut GeomContext,
) -> Result<(GeomMesh, TessellationDiagnostics), TessellationError> {
    config.validate()?;

    let bucket = if config.is_adaptive() {
        TimingBucket::AdaptiveTessellation
    } else {
        TimingBucket::UniformTessellation
    };
    let per_patch = ctx
        .metrics
        .time(bucket, || tessellate_each(patches.as_slice(), config))?;

    let mut mesh = GeomMesh::new();
    let mut diagnostics = TessellationDiagnostics {
        patch_count: patches.len(),
        ..TessellationDiagnostics::default()
    };
    ctx.metrics.time(TimingBucket::MeshAssembly, || {
        for (patch_mesh, stats) in &per_patch {
            mesh.append(patch_mesh);
            diagnostics.record_stats(stats);
        }
    });

    diagnostics.vertex_count = mesh.vertex_count();
    diagnostics.triangle_count = mesh.triangle_count();
    diagnostics.line_count = mesh.line_count();
    if diagnostics.depth_limit_hits > 0 {
        diagnostics.add_warning(format!(
            "depth limit reached on {} triangles; tolerance not met everywhere",
            diagnostics.depth_limit_hits
        ));
    }
    if diagnostics.degenerate_normal_count > 0 {
        diagnostics.add_warning(format!(
            "{} samples had a degenerate surface normal",
            diagnostics.degenerate_normal_count
        ));
    }
    diagnostics.timing = ctx.metrics.end();

    log::debug!("mesh_patches: {}", diagnostics.summary());
    Ok((mesh, diagnostics))
}

fn tessellate_one(
    patch: &BezierPatch,
    config: &TessellationConfig,
) -> Result<(GeomMesh, TessellationStats), TessellationError> {
    let mut mesh = GeomMesh::new();
    let stats = tessellate_validated(patch, config, &mut mesh)?;
    Ok((mesh, stats))
}

#[cfg(feature = "parallel")]
fn tessellate_each(
    patches: &[BezierPatch],
    config: &TessellationConfig,
) -> Result<Vec<(GeomMesh, TessellationStats)>, TessellationError> {
    patches
        .par_iter()
        .map(|patch| tessellate_one(patch, config))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn tessellate_each(
    patches: &[BezierPatch],
    config: &TessellationConfig,
) -> Result<Vec<(GeomMesh, TessellationStats)>, TessellationError> {
    patches
        .iter()
        .map(|patch| tessellate_one(patch, config))
        .collect()
}
