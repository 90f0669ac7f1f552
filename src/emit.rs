use crate::bounds::BoundingBox;
use crate::cell::{Cell, Face, Point3, Triangle};
use crate::explode::{DegenerateVertex, ExplodedCell};
use rayon::prelude::*;
use serde::Serialize;

/// Anything that can be flattened into a [`CellMesh`].
///
/// Implemented for full-size cells and their exploded copies so both go
/// through the same emitter.
pub trait MeshSource: Sync {
    fn positions(&self) -> &[Point3];
    fn mesh_faces(&self) -> &[Face];
}

impl MeshSource for Cell {
    fn positions(&self) -> &[Point3] {
        self.vertices()
    }

    fn mesh_faces(&self) -> &[Face] {
        self.faces()
    }
}

impl MeshSource for ExplodedCell<'_> {
    fn positions(&self) -> &[Point3] {
        self.vertices()
    }

    fn mesh_faces(&self) -> &[Face] {
        self.faces()
    }
}

/// Renderer-ready description of one cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellMesh {
    /// Vertex positions, indexed by `triangles`.
    pub positions: Vec<Point3>,
    /// Fan triangles of every face, concatenated in face order.
    pub triangles: Vec<Triangle>,
    /// One closed outline per face, the first point repeated at the end.
    pub face_polylines: Vec<Vec<Point3>>,
}

impl CellMesh {
    pub fn from_source<S: MeshSource + ?Sized>(source: &S) -> CellMesh {
        let positions = source.positions().to_vec();
        let faces = source.mesh_faces();

        let triangles = faces.iter().flat_map(|f| f.triangulate()).collect();
        let face_polylines = faces
            .iter()
            .map(|f| {
                let mut line: Vec<Point3> = f.indices().iter().map(|&i| positions[i]).collect();
                line.push(positions[f.indices()[0]]);
                line
            })
            .collect();

        CellMesh {
            positions,
            triangles,
            face_polylines,
        }
    }

    /// Positions as `[x, y, z, x, y, z, ...]`.
    pub fn flat_positions(&self) -> Vec<f64> {
        self.positions.iter().flatten().copied().collect()
    }

    /// Triangle indices as a flat list, three per triangle.
    pub fn flat_indices(&self) -> Vec<u32> {
        self.triangles
            .iter()
            .flat_map(|t| t.indices())
            .map(|i| i as u32)
            .collect()
    }
}

/// Flattens each source into a mesh, preserving order.
pub fn emit_meshes<S: MeshSource>(sources: &[S]) -> Vec<CellMesh> {
    sources.par_iter().map(|s| CellMesh::from_source(s)).collect()
}

/// Everything the external renderer draws for one scene.
///
/// Mesh lists are index aligned with the source cell order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SceneGeometry {
    /// Generator point markers.
    pub points: Vec<Point3>,
    /// Centroid markers, one per cell.
    pub centroids: Vec<Point3>,
    /// Wireframe polylines.
    pub edges: Vec<Vec<Point3>>,
    /// Cells at full size, for solid rendering.
    pub solid: Vec<CellMesh>,
    /// Cells pulled slightly towards their centroids.
    pub shrunk: Vec<CellMesh>,
    /// Offset copy used to render gaps between cells.
    pub gap: Vec<CellMesh>,
    /// Vertices that could not be displaced in either exploded copy.
    pub degenerate: Vec<DegenerateVertex>,
    /// Extent of all emitted geometry, `None` for an empty scene.
    pub bounds: Option<BoundingBox>,
}

impl SceneGeometry {
    pub fn count_cells(&self) -> usize {
        self.solid.len()
    }
}

/// Extent over markers, edges and full-size cell vertices.
pub fn scene_bounds(points: &[Point3], edges: &[Vec<Point3>], cells: &[Cell]) -> Option<BoundingBox> {
    let all = points
        .iter()
        .chain(edges.iter().flatten())
        .chain(cells.iter().flat_map(|c| c.vertices().iter()));
    BoundingBox::from_points(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explode::Explosion;

    fn square_pyramid() -> Cell {
        let vertices = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.5, 0.5, 1.0],
        ];
        let faces = vec![
            vec![3, 2, 1, 0],
            vec![0, 1, 4],
            vec![1, 2, 4],
            vec![2, 3, 4],
            vec![3, 0, 4],
        ];
        Cell::new(0, [0.5, 0.5, 0.25], vertices, faces).unwrap()
    }

    #[test]
    fn test_mesh_buffers() {
        let cell = square_pyramid();
        let mesh = CellMesh::from_source(&cell);
        assert_eq!(mesh.positions.len(), 5);
        assert_eq!(mesh.triangles.len(), 6);
        assert_eq!(mesh.flat_positions().len(), 15);
        assert_eq!(&mesh.flat_indices()[..6], &[3, 2, 1, 3, 1, 0]);
        assert_eq!(mesh.face_polylines.len(), 5);
        assert_eq!(mesh.face_polylines[0].len(), 5);
        assert_eq!(mesh.face_polylines[0].first(), mesh.face_polylines[0].last());
        assert_eq!(mesh.face_polylines[1], vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 0.5, 1.0], [0.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_exploded_mesh_shares_topology() {
        let cells = vec![square_pyramid(), square_pyramid()];
        let exploded = Explosion::gap().apply_all(&cells);
        let solid = emit_meshes(&cells);
        let gap = emit_meshes(&exploded);
        assert_eq!(solid.len(), 2);
        assert_eq!(gap.len(), 2);
        assert_eq!(solid[0].triangles, gap[0].triangles);
        assert_ne!(solid[0].positions, gap[0].positions);
    }

    #[test]
    fn test_scene_bounds() {
        let cells = vec![square_pyramid()];
        let b = scene_bounds(&[[-1.0, 0.5, 0.5]], &[vec![[0.0, 3.0, 0.0]]], &cells).unwrap();
        assert_eq!(b.min, [-1.0, 0.0, 0.0]);
        assert_eq!(b.max, [1.0, 3.0, 1.0]);
        assert!(scene_bounds(&[], &[], &[]).is_none());
    }
}
