//! Opt-in timing hooks for the tessellation pipeline.
//!
//! Timing is only collected when the `mesh_engine_metrics` feature is enabled
//! and the target is not `wasm32` (`std::time::Instant` is unavailable there).
//! Otherwise every call is a no-op and [`GeomMetrics::end`] returns `None`.
//!
//! ```ignore
//! use bez_engine::geom::{GeomMetrics, TimingBucket};
//!
//! let mut metrics = GeomMetrics::default();
//! metrics.begin();
//! let patches = metrics.time(TimingBucket::Parse, || parse_file(path))?;
//! if let Some(report) = metrics.end() {
//!     println!("parse: {} ns", report.parse_ns);
//! }
//! ```

use serde::Serialize;

/// Pipeline phase a measurement is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Reading `.bez` text into patches.
    Parse,
    UniformTessellation,
    AdaptiveTessellation,
    /// Concatenating per-patch output into the final mesh.
    MeshAssembly,
}

/// Cumulative nanoseconds per bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct GeomTimingReport {
    pub parse_ns: u64,
    pub uniform_tessellation_ns: u64,
    pub adaptive_tessellation_ns: u64,
    pub mesh_assembly_ns: u64,
}

impl GeomTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.parse_ns
            .saturating_add(self.uniform_tessellation_ns)
            .saturating_add(self.adaptive_tessellation_ns)
            .saturating_add(self.mesh_assembly_ns)
    }

    /// Total in milliseconds, for display.
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }

    #[cfg_attr(
        not(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32"))),
        allow(dead_code)
    )]
    fn bucket_mut(&mut self, bucket: TimingBucket) -> &mut u64 {
        match bucket {
            TimingBucket::Parse => &mut self.parse_ns,
            TimingBucket::UniformTessellation => &mut self.uniform_tessellation_ns,
            TimingBucket::AdaptiveTessellation => &mut self.adaptive_tessellation_ns,
            TimingBucket::MeshAssembly => &mut self.mesh_assembly_ns,
        }
    }
}

/// Accumulator for timing pipeline phases.
///
/// Call [`begin`](Self::begin) to reset, wrap work in [`time`](Self::time),
/// and read the result with [`end`](Self::end).
#[derive(Debug, Default)]
pub struct GeomMetrics {
    #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
    report: GeomTimingReport,
}

impl GeomMetrics {
    pub fn begin(&mut self) {
        #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
        {
            self.report = GeomTimingReport::default();
        }
    }

    /// Returns the accumulated report, or `None` if metrics are disabled.
    #[must_use]
    pub fn end(&self) -> Option<GeomTimingReport> {
        #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Runs `f` and charges the elapsed time to `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            // Cap at u64::MAX to prevent overflow
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            let slot = self.report.bucket_mut(bucket);
            *slot = slot.saturating_add(nanos);
            result
        }

        #[cfg(not(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_report_total() {
        let report = GeomTimingReport {
            parse_ns: 1000,
            uniform_tessellation_ns: 2000,
            mesh_assembly_ns: 3000,
            ..Default::default()
        };
        assert_eq!(report.total_ns(), 6000);
        assert!((report.total_ms() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_slots_are_distinct() {
        let mut report = GeomTimingReport::default();
        for (i, bucket) in [
            TimingBucket::Parse,
            TimingBucket::UniformTessellation,
            TimingBucket::AdaptiveTessellation,
            TimingBucket::MeshAssembly,
        ]
        .into_iter()
        .enumerate()
        {
            *report.bucket_mut(bucket) += 1 << i;
        }
        assert_eq!(report.parse_ns, 1);
        assert_eq!(report.uniform_tessellation_ns, 2);
        assert_eq!(report.adaptive_tessellation_ns, 4);
        assert_eq!(report.mesh_assembly_ns, 8);
    }

    #[test]
    fn test_time_returns_closure_result() {
        let mut metrics = GeomMetrics::default();
        metrics.begin();
        let result = metrics.time(TimingBucket::AdaptiveTessellation, || 42);
        assert_eq!(result, 42);

        #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
        assert!(metrics.end().is_some());
        #[cfg(not(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32"))))]
        assert!(metrics.end().is_none());
    }
}
