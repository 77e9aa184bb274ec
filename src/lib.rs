#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;
pub mod parse;

use std::fmt;

use geom::{GeomMesh, PatchSet, TessellationConfig, TessellationDiagnostics, mesh_patches};
use serde::Serialize;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("could not start rayon thread pool: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Mesh buffers as handed to JavaScript: flat arrays ready for a
/// `BufferGeometry`.
#[derive(Debug, Serialize)]
struct MeshExport<'a> {
    positions: &'a [f64],
    normals: &'a [f64],
    indices: &'a [u32],
    line_indices: &'a [u32],
}

impl<'a> From<&'a GeomMesh> for MeshExport<'a> {
    fn from(mesh: &'a GeomMesh) -> Self {
        Self {
            positions: mesh.positions_flat(),
            normals: mesh.normals_flat(),
            indices: &mesh.indices,
            line_indices: &mesh.line_indices,
        }
    }
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct Engine {
    patches: Option<PatchSet>,
    config: TessellationConfig,
    mesh: Option<GeomMesh>,
    diagnostics: Option<TessellationDiagnostics>,
    result_dirty: bool,
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        Engine {
            patches: None,
            config: TessellationConfig::default(),
            mesh: None,
            diagnostics: None,
            result_dirty: false,
        }
    }

    /// Whether a mesh for the current patches and configuration is available.
    #[wasm_bindgen]
    pub fn is_tessellated(&self) -> bool {
        self.mesh().is_some()
    }

    /// Loads `.bez` text, replacing any previously loaded patches.
    #[wasm_bindgen]
    pub fn load_bez(&mut self, text: &str) -> Result<(), JsValue> {
        let patches = parse::parse_str(text).map_err(to_js_error)?;
        debug_log!("load_bez: {} patches", patches.len());

        self.patches = Some(patches);
        self.mesh = None;
        self.diagnostics = None;
        self.result_dirty = true;
        Ok(())
    }

    /// Number of loaded patches (0 before anything is loaded).
    #[wasm_bindgen]
    pub fn patch_count(&self) -> usize {
        self.patches.as_ref().map_or(0, PatchSet::len)
    }

    /// Switches to uniform tessellation with `step` cells per side.
    #[wasm_bindgen]
    pub fn set_uniform(&mut self, step: usize) -> Result<(), JsValue> {
        let config = TessellationConfig {
            mode: geom::TessellationMode::Uniform { step },
            ..self.config
        };
        self.apply_config(config)
    }

    /// Switches to adaptive tessellation.
    #[wasm_bindgen]
    pub fn set_adaptive(&mut self, tolerance: f64, max_depth: usize) -> Result<(), JsValue> {
        let config = TessellationConfig {
            mode: geom::TessellationMode::Adaptive {
                tolerance,
                max_depth,
            },
            ..self.config
        };
        self.apply_config(config)
    }

    #[wasm_bindgen]
    pub fn set_wireframe(&mut self, wireframe: bool) -> Result<(), JsValue> {
        self.apply_config(self.config.with_wireframe(wireframe))
    }

    #[wasm_bindgen]
    pub fn set_flat_shading(&mut self, flat: bool) -> Result<(), JsValue> {
        self.apply_config(self.config.with_flat_shading(flat))
    }

    /// Replaces the whole configuration from a JS object, e.g.
    /// `{ mode: { kind: "adaptive", tolerance: 0.01, max_depth: 8 }, primitives: "wireframe" }`.
    #[wasm_bindgen]
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config: TessellationConfig =
            serde_wasm_bindgen::from_value(config).map_err(to_js_error)?;
        self.apply_config(config)
    }

    #[wasm_bindgen]
    pub fn get_config(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.config).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Tessellates the loaded patches with the current configuration.
    #[wasm_bindgen]
    pub fn tessellate(&mut self) -> Result<(), JsValue> {
        if !self.result_dirty && self.mesh.is_some() {
            return Ok(());
        }

        let Some(patches) = self.patches.as_ref() else {
            return Err(js_error("no .bez file has been loaded"));
        };

        let (mesh, diagnostics) = mesh_patches(patches, &self.config).map_err(to_js_error)?;
        debug_log!("tessellate: {}", diagnostics.summary());

        self.mesh = Some(mesh);
        self.diagnostics = Some(diagnostics);
        self.result_dirty = false;
        Ok(())
    }

    /// Mesh of the last tessellation as flat buffers.
    #[wasm_bindgen]
    pub fn get_mesh(&self) -> Result<JsValue, JsValue> {
        let mesh = self.current_mesh()?;
        serde_wasm_bindgen::to_value(&MeshExport::from(mesh))
            .map_err(|err| JsError::new(&err.to_string()).into())
    }

    #[wasm_bindgen]
    pub fn get_diagnostics(&self) -> Result<JsValue, JsValue> {
        let diagnostics = self.current_diagnostics()?;
        serde_wasm_bindgen::to_value(diagnostics).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Last tessellation as Wavefront OBJ text.
    #[wasm_bindgen]
    pub fn get_obj(&self) -> Result<String, JsValue> {
        Ok(self.current_mesh()?.to_obj("bez"))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &TessellationConfig {
        &self.config
    }

    /// Mesh of the last successful [`tessellate`](Self::tessellate), if it is
    /// still current.
    #[must_use]
    pub fn mesh(&self) -> Option<&GeomMesh> {
        if self.result_dirty {
            None
        } else {
            self.mesh.as_ref()
        }
    }

    #[must_use]
    pub fn diagnostics(&self) -> Option<&TessellationDiagnostics> {
        if self.result_dirty {
            None
        } else {
            self.diagnostics.as_ref()
        }
    }

    fn apply_config(&mut self, config: TessellationConfig) -> Result<(), JsValue> {
        config.validate().map_err(to_js_error)?;
        if config != self.config {
            self.config = config;
            self.result_dirty = true;
        }
        Ok(())
    }

    fn current_mesh(&self) -> Result<&GeomMesh, JsValue> {
        self.mesh()
            .ok_or_else(|| js_error("patches have not been tessellated yet"))
    }

    fn current_diagnostics(&self) -> Result<&TessellationDiagnostics, JsValue> {
        self.diagnostics()
            .ok_or_else(|| js_error("patches have not been tessellated yet"))
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
