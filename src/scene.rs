use crate::cell::{Cell, Point3, build_cells};
use crate::emit::{SceneGeometry, emit_meshes, scene_bounds};
use crate::error::{Resource, SceneResult};
use crate::explode::{DEFAULT_GAP, DEFAULT_SHRINK, Explosion};
use crate::parsers::{parse_cell_faces, parse_cell_vertices, parse_centroids, parse_points, parse_polylines};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// File name prefix used by the tessellation exporter.
pub const DEFAULT_PREFIX: &str = "random_points";

/// Where each of the five resources lives, relative to a store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcePaths {
    pub points: String,
    pub edges: String,
    pub cell_vertices: String,
    pub cell_faces: String,
    pub cell_centroids: String,
}

impl ResourcePaths {
    /// Default export names for a given prefix, e.g. `<prefix>_p.gnu`.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            points: format!("{prefix}_p.gnu"),
            edges: format!("{prefix}_v.gnu"),
            cell_vertices: format!("{prefix}_cell_vertices.vol"),
            cell_faces: format!("{prefix}_cell_faces.vol"),
            cell_centroids: format!("{prefix}_centroids.vol"),
        }
    }

    pub fn location(&self, resource: Resource) -> &str {
        match resource {
            Resource::Points => &self.points,
            Resource::Edges => &self.edges,
            Resource::CellVertices => &self.cell_vertices,
            Resource::CellFaceIndices => &self.cell_faces,
            Resource::CellCentroids => &self.cell_centroids,
        }
    }
}

impl Default for ResourcePaths {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }
}

/// Configuration for loading and exploding a scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Locations of the input resources.
    pub resources: ResourcePaths,
    /// Distance each vertex is pulled towards its centroid in the shrunk copy.
    pub shrink: f64,
    /// Distance used for the gap copy.
    pub gap: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            resources: ResourcePaths::default(),
            shrink: DEFAULT_SHRINK,
            gap: DEFAULT_GAP,
        }
    }
}

impl SceneConfig {
    #[must_use]
    pub fn with_resources(mut self, resources: ResourcePaths) -> Self {
        self.resources = resources;
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.resources = ResourcePaths::with_prefix(prefix);
        self
    }

    #[must_use]
    pub fn with_shrink(mut self, distance: f64) -> Self {
        self.shrink = distance;
        self
    }

    #[must_use]
    pub fn with_gap(mut self, distance: f64) -> Self {
        self.gap = distance;
        self
    }

    /// The two displacement policies, failing on non-finite distances.
    pub fn explosions(&self) -> SceneResult<(Explosion, Explosion)> {
        Ok((Explosion::new(self.shrink)?, Explosion::new(self.gap)?))
    }
}

/// Raw text of the five resources.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneSources {
    pub points: String,
    pub edges: String,
    pub cell_vertices: String,
    pub cell_faces: String,
    pub cell_centroids: String,
}

impl SceneSources {
    pub fn get(&self, resource: Resource) -> &str {
        match resource {
            Resource::Points => &self.points,
            Resource::Edges => &self.edges,
            Resource::CellVertices => &self.cell_vertices,
            Resource::CellFaceIndices => &self.cell_faces,
            Resource::CellCentroids => &self.cell_centroids,
        }
    }
}

/// Parsed and validated scene content.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub points: Vec<Point3>,
    pub edges: Vec<Vec<Point3>>,
    pub cells: Vec<Cell>,
}

impl Scene {
    /// Parses all five resources and assembles the cells.
    pub fn parse(sources: &SceneSources) -> SceneResult<Scene> {
        for resource in Resource::ALL {
            debug!(%resource, bytes = sources.get(resource).len(), "parsing resource");
        }

        let points = parse_points(&sources.points)?;
        let edges = parse_polylines(&sources.edges)?;
        let vertices = parse_cell_vertices(&sources.cell_vertices)?;
        let faces = parse_cell_faces(&sources.cell_faces)?;
        let centroids = parse_centroids(&sources.cell_centroids)?;
        let cells = build_cells(vertices, faces, centroids)?;

        let total_volume: f64 = cells.iter().map(|c| c.volume()).sum();
        debug!(total_volume, "cell volume");
        info!(
            points = points.len(),
            edges = edges.len(),
            cells = cells.len(),
            "parsed scene"
        );

        Ok(Scene { points, edges, cells })
    }

    pub fn count_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn centroids(&self) -> Vec<Point3> {
        self.cells.iter().map(|c| c.centroid()).collect()
    }

    /// Emits the full-size, shrunk and gap copies of every cell plus markers.
    pub fn geometry(&self, shrink: &Explosion, gap: &Explosion) -> SceneGeometry {
        let shrunk = shrink.apply_all(&self.cells);
        let gapped = gap.apply_all(&self.cells);

        let mut degenerate: Vec<_> = shrunk
            .iter()
            .chain(gapped.iter())
            .flat_map(|c| c.degenerate().iter().copied())
            .collect();
        degenerate.sort_by_key(|d| (d.cell, d.vertex));
        degenerate.dedup();

        SceneGeometry {
            points: self.points.clone(),
            centroids: self.centroids(),
            edges: self.edges.clone(),
            solid: emit_meshes(&self.cells),
            shrunk: emit_meshes(&shrunk),
            gap: emit_meshes(&gapped),
            degenerate,
            bounds: scene_bounds(&self.points, &self.edges, &self.cells),
        }
    }
}

/// Runs the whole pipeline on already fetched text.
pub fn build_scene(sources: &SceneSources, config: &SceneConfig) -> SceneResult<SceneGeometry> {
    let (shrink, gap) = config.explosions()?;
    let scene = Scene::parse(sources)?;
    let geometry = scene.geometry(&shrink, &gap);
    info!(
        cells = geometry.count_cells(),
        degenerate = geometry.degenerate.len(),
        "emitted scene geometry"
    );
    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_paths_prefix() {
        let paths = ResourcePaths::with_prefix("run");
        assert_eq!(paths.location(Resource::Points), "run_p.gnu");
        assert_eq!(paths.location(Resource::Edges), "run_v.gnu");
        assert_eq!(paths.location(Resource::CellCentroids), "run_centroids.vol");
    }

    #[test]
    fn test_config_defaults_and_builders() {
        let config = SceneConfig::default();
        assert_eq!(config.shrink, 0.01);
        assert_eq!(config.gap, 0.1);

        let config = config.with_prefix("x").with_gap(0.25);
        assert_eq!(config.resources.cell_faces, "x_cell_faces.vol");
        assert_eq!(config.gap, 0.25);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: SceneConfig = serde_json::from_str(r#"{ "gap": 0.5, "resources": { "points": "p.txt" } }"#).unwrap();
        assert_eq!(config.gap, 0.5);
        assert_eq!(config.shrink, DEFAULT_SHRINK);
        assert_eq!(config.resources.points, "p.txt");
        assert_eq!(config.resources.edges, "random_points_v.gnu");
    }

    #[test]
    fn test_build_scene_rejects_bad_distance() {
        let config = SceneConfig::default().with_shrink(f64::NAN);
        assert!(build_scene(&SceneSources::default(), &config).is_err());
    }

    #[test]
    fn test_empty_sources_give_empty_scene() {
        let geometry = build_scene(&SceneSources::default(), &SceneConfig::default()).unwrap();
        assert_eq!(geometry.count_cells(), 0);
        assert!(geometry.bounds.is_none());
    }
}
