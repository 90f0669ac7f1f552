//! # voroscene
//!
//! `voroscene` turns a 3D Voronoi tessellation exported as flat text files into
//! renderable geometry. It is meant to sit between a tessellation exporter and a
//! renderer, in Rust as well as compiled to WebAssembly (WASM).
//!
//! ## Features
//!
//! - **Format parsers**: generator points, wireframe edge blocks, bracketed per-cell
//!   vertex and face rows, and centroid columns, each with its own quirks.
//! - **Validated cells**: face indices are checked against the cell's vertices and
//!   the three per-cell resources must agree on the cell count.
//! - **Fan triangulation**: every convex face becomes `n - 2` triangles.
//! - **Exploded views**: vertices pulled a fixed distance towards their centroid,
//!   once to shrink cells in place and once for a gap copy.
//! - **WASM-first**: [`wasm::VoronoiScene`] hands flat buffers to JavaScript.
//!
//! ## Main Interface
//!
//! [`build_scene`] runs the whole pipeline on already fetched text, and on native
//! targets [`load_scene`] fetches the resources from a [`FileStore`] or
//! [`HttpStore`] first.

mod bounds;
mod cell;
mod emit;
mod error;
mod explode;
#[cfg(not(target_arch = "wasm32"))]
mod loader;
pub mod parsers;
mod scene;
pub mod wasm;

pub use bounds::BoundingBox;
pub use cell::{Cell, Face, Point3, Triangle, build_cells};
pub use emit::{CellMesh, MeshSource, SceneGeometry, emit_meshes};
pub use error::{Resource, SceneError, SceneResult};
pub use explode::{DEFAULT_GAP, DEFAULT_SHRINK, DegenerateVertex, ExplodedCell, Explosion};
#[cfg(not(target_arch = "wasm32"))]
pub use loader::{FileStore, HttpStore, ResourceStore, fetch_sources, load_scene};
pub use parsers::NumberKind;
pub use scene::{DEFAULT_PREFIX, ResourcePaths, Scene, SceneConfig, SceneSources, build_scene};
