//! Diagnostics for a tessellation run.
//!
//! Collected alongside the mesh by [`super::mesh_patches`] and useful for:
//!
//! - checking how hard the adaptive refinement worked (subdivisions, depth)
//! - spotting input problems (degenerate normals, depth budget exhausted)
//! - profiling (timing buckets, when `mesh_engine_metrics` is enabled)
//!
//! ```ignore
//! use bez_engine::geom::{TessellationConfig, mesh_patches};
//!
//! let (mesh, diagnostics) = mesh_patches(&patches, &TessellationConfig::adaptive(0.01, 8))?;
//! log::info!("{}", diagnostics.summary());
//! for warning in &diagnostics.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! ```

use std::fmt;

use serde::Serialize;

use super::metrics::GeomTimingReport;
use super::tessellation::TessellationStats;

/// Counts and warnings describing one call to the patch-level tessellator.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TessellationDiagnostics {
    pub patch_count: usize,

    /// Vertices in the assembled mesh (vertices are not shared between primitives).
    pub vertex_count: usize,

    /// Filled triangles in the mesh. Zero in wireframe mode.
    pub triangle_count: usize,

    /// Line segments in the mesh; three per tessellated triangle in wireframe mode.
    pub line_count: usize,

    /// Number of surface evaluations (grid points plus adaptive corners and midpoints).
    pub surface_evaluations: usize,

    /// Evaluations whose normal had to be recovered. Typical for patches with
    /// a collapsed edge or corner, suspicious otherwise.
    pub degenerate_normal_count: usize,

    /// Adaptive splits performed across all patches.
    pub subdivisions: usize,

    /// Deepest adaptive level at which a triangle was emitted.
    pub max_depth_reached: usize,

    /// Adaptive triangles emitted because the depth budget ran out rather
    /// than because they were flat enough.
    ///
    /// Non-zero means the tolerance was not met everywhere.
    pub depth_limit_hits: usize,

    /// Only populated when the `mesh_engine_metrics` feature is enabled and
    /// the target is not WASM.
    pub timing: Option<GeomTimingReport>,

    /// Human-readable notes, e.g. "depth limit reached on 12 triangles".
    pub warnings: Vec<String>,
}

impl TessellationDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the tessellation counters from `stats`.
    pub fn record_stats(&mut self, stats: &TessellationStats) {
        self.surface_evaluations += stats.surface_evaluations;
        self.degenerate_normal_count += stats.degenerate_normals;
        self.subdivisions += stats.subdivisions;
        self.max_depth_reached = self.max_depth_reached.max(stats.max_depth_reached);
        self.depth_limit_hits += stats.depth_limit_hits;
    }

    /// Returns `true` if every adaptive triangle met the tolerance.
    #[must_use]
    pub fn tolerance_met(&self) -> bool {
        self.depth_limit_hits == 0
    }

    /// Returns `true` if no warnings were recorded and no normal needed recovery.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.degenerate_normal_count == 0 && self.tolerance_met() && self.warnings.is_empty()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Short summary suitable for logging.
    ///
    /// Format: `"P:{patches} V:{vertices} T:{triangles} [L:{lines}] [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "P:{} V:{} T:{}",
            self.patch_count, self.vertex_count, self.triangle_count
        )];

        if self.line_count > 0 {
            parts.push(format!("L:{}", self.line_count));
        }
        if self.max_depth_reached > 0 {
            parts.push(format!("depth:{}", self.max_depth_reached));
        }
        if self.depth_limit_hits > 0 {
            parts.push(format!("depth-limit:{}", self.depth_limit_hits));
        }
        if self.degenerate_normal_count > 0 {
            parts.push(format!("degenerate-normals:{}", self.degenerate_normal_count));
        }

        parts.join(" ")
    }
}

impl fmt::Display for TessellationDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tessellation Diagnostics:")?;
        writeln!(f, "  Patches: {}", self.patch_count)?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;
        if self.line_count > 0 {
            writeln!(f, "  Lines: {}", self.line_count)?;
        }
        writeln!(f, "  Surface evaluations: {}", self.surface_evaluations)?;

        if self.subdivisions > 0 || self.max_depth_reached > 0 {
            writeln!(f, "  Adaptive:")?;
            writeln!(f, "    - Subdivisions: {}", self.subdivisions)?;
            writeln!(f, "    - Max depth reached: {}", self.max_depth_reached)?;
            if self.depth_limit_hits > 0 {
                writeln!(f, "    - Depth limit hits: {}", self.depth_limit_hits)?;
            }
        }

        if self.degenerate_normal_count > 0 {
            writeln!(f, "  Degenerate normals: {}", self.degenerate_normal_count)?;
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        let status = if self.is_clean() { "CLEAN" } else { "SEE WARNINGS" };
        writeln!(f, "  Status: {status}")?;

        Ok(())
    }
}
