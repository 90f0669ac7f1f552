use crate::emit::{CellMesh, SceneGeometry};
use crate::scene::{SceneConfig, SceneSources, build_scene};
use js_sys::{Array, Float64Array};
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

/// Which copy of the cells a buffer is read from.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellVariant {
    Solid = 0,
    Shrunk = 1,
    Gap = 2,
}

/// Scene geometry for a JavaScript renderer.
///
/// The caller fetches the five text resources and hands them over; all
/// buffers come back flat, `[x, y, z, x, y, z, ...]` for positions.
#[wasm_bindgen(js_name = VoronoiScene)]
pub struct VoronoiScene {
    inner: SceneGeometry,
}

#[wasm_bindgen(js_class = VoronoiScene)]
impl VoronoiScene {
    #[wasm_bindgen(constructor)]
    pub fn new(
        points: String,
        edges: String,
        cell_vertices: String,
        cell_faces: String,
        cell_centroids: String,
        shrink: f64,
        gap: f64,
    ) -> Result<VoronoiScene, JsError> {
        let sources = SceneSources {
            points,
            edges,
            cell_vertices,
            cell_faces,
            cell_centroids,
        };
        let config = SceneConfig::default().with_shrink(shrink).with_gap(gap);
        let inner = build_scene(&sources, &config)?;
        Ok(VoronoiScene { inner })
    }

    #[wasm_bindgen(getter)]
    pub fn count_cells(&self) -> usize {
        self.inner.count_cells()
    }

    #[wasm_bindgen(getter)]
    pub fn count_degenerate(&self) -> usize {
        self.inner.degenerate.len()
    }

    #[wasm_bindgen(getter)]
    pub fn points(&self) -> Vec<f64> {
        self.inner.points.iter().flatten().copied().collect()
    }

    #[wasm_bindgen(getter)]
    pub fn centroids(&self) -> Vec<f64> {
        self.inner.centroids.iter().flatten().copied().collect()
    }

    /// `[min_x, min_y, min_z, max_x, max_y, max_z]`, empty for an empty scene.
    #[wasm_bindgen(getter)]
    pub fn bounds(&self) -> Vec<f64> {
        match self.inner.bounds {
            Some(b) => b.min.iter().chain(b.max.iter()).copied().collect(),
            None => Vec::new(),
        }
    }

    /// `[x, y, z]` midpoint of the scene, empty for an empty scene.
    #[wasm_bindgen(getter)]
    pub fn bounds_center(&self) -> Vec<f64> {
        self.inner.bounds.map(|b| b.center().to_vec()).unwrap_or_default()
    }

    /// `[dx, dy, dz]` extent of the scene, empty for an empty scene.
    #[wasm_bindgen(getter)]
    pub fn bounds_size(&self) -> Vec<f64> {
        self.inner.bounds.map(|b| b.size().to_vec()).unwrap_or_default()
    }

    // Workaround for the fact that wasm-bindgen does not support nested vectors directly
    #[wasm_bindgen(getter)]
    pub fn edges(&self) -> Array {
        polylines_to_js(&self.inner.edges)
    }

    pub fn positions(&self, index: usize, variant: CellVariant) -> Option<Vec<f64>> {
        self.mesh(index, variant).map(|m| m.flat_positions())
    }

    pub fn indices(&self, index: usize, variant: CellVariant) -> Option<Vec<u32>> {
        self.mesh(index, variant).map(|m| m.flat_indices())
    }

    pub fn face_polylines(&self, index: usize, variant: CellVariant) -> Option<Array> {
        self.mesh(index, variant).map(|m| polylines_to_js(&m.face_polylines))
    }
}

impl VoronoiScene {
    fn mesh(&self, index: usize, variant: CellVariant) -> Option<&CellMesh> {
        let meshes = match variant {
            CellVariant::Solid => &self.inner.solid,
            CellVariant::Shrunk => &self.inner.shrunk,
            CellVariant::Gap => &self.inner.gap,
        };
        meshes.get(index)
    }
}

fn polylines_to_js(lines: &[Vec<[f64; 3]>]) -> Array {
    let result = Array::new_with_length(lines.len() as u32);
    for (i, line) in lines.iter().enumerate() {
        let flat: Vec<f64> = line.iter().flatten().copied().collect();
        result.set(i as u32, Float64Array::from(flat.as_slice()).into());
    }
    result
}
