mod adaptive;
mod core;
mod curve;
mod diagnostics;
mod mesh;
mod metrics;
mod patch;
mod surface;
mod tessellation;

pub use adaptive::{
    EdgeFailures, ParamVertex, tessellate_patch_adaptive, tessellate_triangle_adaptive,
};
pub use core::{BBox, Point3, Tolerance, Vec3};
pub use curve::{CubicBezier3, CurveSample};
pub use diagnostics::TessellationDiagnostics;
pub use metrics::{GeomMetrics, GeomTimingReport, TimingBucket};
pub use mesh::{
    GeomContext, GeomMesh, GeometrySink, Primitive, Vertex, mesh_patches,
    mesh_patches_with_context,
};
pub use patch::{BezierPatch, ControlGrid, PatchError, PatchSet};
pub use surface::{NORMAL_NUDGE, Surface, SurfaceSample};
pub use tessellation::{
    DEEP_RECURSION_WARNING, DEFAULT_STEP, GridSample, PrimitiveMode, ShadingMode, SurfaceGrid,
    TessellationConfig, TessellationError, TessellationMode, TessellationStats, grid_parameter,
    sample_surface_grid, tessellate_patch, tessellate_uniform,
};

#[cfg(test)]
mod tests;
