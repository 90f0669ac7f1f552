use crate::error::{SceneError, SceneResult};
use serde::Serialize;
use tracing::debug;

/// A position in 3D space, `[x, y, z]`.
pub type Point3 = [f64; 3];

/// A planar polygon on a cell boundary, given as indices into the cell's vertices.
///
/// Winding order is kept as exported. Always has at least three indices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Face(Vec<usize>);

impl Face {
    /// Wraps an index list, or returns `None` if it has fewer than three entries.
    pub fn new(indices: Vec<usize>) -> Option<Face> {
        if indices.len() < 3 {
            return None;
        }
        Some(Face(indices))
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fan triangulation anchored at the first vertex.
    ///
    /// An n-gon yields n - 2 triangles `(f[0], f[i + 1], f[i + 2])`. Faces are
    /// assumed convex, which holds for Voronoi cells.
    pub fn triangulate(&self) -> Vec<Triangle> {
        let v0 = self.0[0];
        self.0[1..]
            .windows(2)
            .map(|pair| Triangle([v0, pair[0], pair[1]]))
            .collect()
    }
}

/// Three vertex indices of a cell, produced only by [`Face::triangulate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Triangle([usize; 3]);

impl Triangle {
    pub fn indices(&self) -> [usize; 3] {
        self.0
    }
}

/// A convex Voronoi cell: centroid, local vertices and the faces over them.
///
/// Every face index is below `vertices.len()` and every vertex is used, which
/// [`Cell::new`] checks.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub(crate) id: usize,
    pub(crate) centroid: Point3,
    pub(crate) vertices: Vec<Point3>,
    pub(crate) faces: Vec<Face>,
}

impl Cell {
    /// Builds a cell from raw face index lists, checking its invariants.
    ///
    /// `id` is the cell's position in the source files and is used in errors.
    pub fn new(id: usize, centroid: Point3, vertices: Vec<Point3>, faces: Vec<Vec<usize>>) -> SceneResult<Cell> {
        if faces.is_empty() {
            return Err(SceneError::EmptyCell { cell: id });
        }

        let vertex_count = vertices.len();
        let mut max_index = 0;
        let mut used = vec![false; vertex_count];
        let mut checked = Vec::with_capacity(faces.len());
        for (f, indices) in faces.into_iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&index| index >= vertex_count) {
                return Err(SceneError::FaceIndexOutOfRange {
                    cell: id,
                    face: f,
                    index,
                    vertex_count,
                });
            }
            let len = indices.len();
            let face = Face::new(indices).ok_or(SceneError::DegenerateFace { cell: id, face: f, len })?;
            for &index in face.indices() {
                used[index] = true;
                max_index = max_index.max(index);
            }
            checked.push(face);
        }

        if max_index + 1 != vertex_count {
            return Err(SceneError::UnusedVertices {
                cell: id,
                max_index,
                vertex_count,
            });
        }
        if let Some(vertex) = used.iter().position(|&u| !u) {
            return Err(SceneError::UnreferencedVertex { cell: id, vertex });
        }

        Ok(Cell {
            id,
            centroid,
            vertices,
            faces: checked,
        })
    }

    /// Position of this cell in the source files.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn centroid(&self) -> Point3 {
        self.centroid
    }

    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Triangles of all faces, concatenated in face order.
    pub fn triangles(&self) -> Vec<Triangle> {
        self.faces.iter().flat_map(|f| f.triangulate()).collect()
    }

    /// Triangles grouped by the face they came from.
    pub fn face_triangles(&self) -> Vec<Vec<Triangle>> {
        self.faces.iter().map(|f| f.triangulate()).collect()
    }

    /// Enclosed volume from the signed tetrahedra of the fan triangles.
    pub fn volume(&self) -> f64 {
        let mut volume: f64 = 0.0;
        for tri in self.triangles() {
            let [a, b, c] = tri.indices();
            let v0 = self.vertices[a];
            let v1 = self.vertices[b];
            let v2 = self.vertices[c];
            volume += dot(v0, cross(v1, v2));
        }
        (volume / 6.0).abs()
    }

    /// Area of one face, or 0 if `face_index` is out of range.
    pub fn face_area(&self, face_index: usize) -> f64 {
        let Some(face) = self.faces.get(face_index) else {
            return 0.0;
        };
        face.triangulate()
            .iter()
            .map(|tri| {
                let [a, b, c] = tri.indices();
                let p0 = self.vertices[a];
                let e1 = sub(self.vertices[b], p0);
                let e2 = sub(self.vertices[c], p0);
                0.5 * length(cross(e1, e2))
            })
            .sum()
    }
}

/// Assembles cells from index-aligned per-cell vertices, faces and centroids.
///
/// Fails on the first cell that violates an invariant, or if the three inputs
/// do not describe the same number of cells.
pub fn build_cells(
    vertices: Vec<Vec<Point3>>,
    faces: Vec<Vec<Vec<usize>>>,
    centroids: Vec<Point3>,
) -> SceneResult<Vec<Cell>> {
    if vertices.len() != faces.len() || faces.len() != centroids.len() {
        return Err(SceneError::CellCountMismatch {
            vertices: vertices.len(),
            faces: faces.len(),
            centroids: centroids.len(),
        });
    }

    let cells = vertices
        .into_iter()
        .zip(faces)
        .zip(centroids)
        .enumerate()
        .map(|(id, ((v, f), c))| Cell::new(id, c, v, f))
        .collect::<SceneResult<Vec<Cell>>>()?;

    debug!(cells = cells.len(), "built cells");
    Ok(cells)
}

pub(crate) fn sub(a: Point3, b: Point3) -> Point3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn dot(a: Point3, b: Point3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: Point3, b: Point3) -> Point3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn length(a: Point3) -> f64 {
    dot(a, a).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> (Vec<Point3>, Vec<Vec<usize>>) {
        let vertices = vec![
            [0.0, 0.0, 0.0], // 0
            [1.0, 0.0, 0.0], // 1
            [1.0, 1.0, 0.0], // 2
            [0.0, 1.0, 0.0], // 3
            [0.0, 0.0, 1.0], // 4
            [1.0, 0.0, 1.0], // 5
            [1.0, 1.0, 1.0], // 6
            [0.0, 1.0, 1.0], // 7
        ];
        let faces = vec![
            vec![3, 2, 1, 0], // z-
            vec![4, 5, 6, 7], // z+
            vec![0, 1, 5, 4], // y-
            vec![2, 3, 7, 6], // y+
            vec![0, 4, 7, 3], // x-
            vec![1, 2, 6, 5], // x+
        ];
        (vertices, faces)
    }

    #[test]
    fn test_fan_triangulation_quad() {
        let face = Face::new(vec![0, 1, 2, 3]).unwrap();
        let tris: Vec<[usize; 3]> = face.triangulate().iter().map(|t| t.indices()).collect();
        assert_eq!(tris, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_fan_triangulation_triangle() {
        let face = Face::new(vec![0, 1, 2]).unwrap();
        let tris: Vec<[usize; 3]> = face.triangulate().iter().map(|t| t.indices()).collect();
        assert_eq!(tris, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_fan_triangulation_count() {
        let face = Face::new((0..7).collect()).unwrap();
        let tris = face.triangulate();
        assert_eq!(tris.len(), 5);
        assert!(tris.iter().all(|t| t.indices()[0] == 0));
        assert_eq!(tris[4].indices(), [0, 5, 6]);
    }

    #[test]
    fn test_face_too_small() {
        assert!(Face::new(vec![0, 1]).is_none());
    }

    #[test]
    fn test_cube_cell_metrics() {
        let (vertices, faces) = unit_cube();
        let cell = Cell::new(0, [0.5, 0.5, 0.5], vertices, faces).unwrap();
        assert_eq!(cell.triangles().len(), 12);
        assert_eq!(cell.face_triangles().len(), 6);
        assert!((cell.volume() - 1.0).abs() < 1e-12, "Expected volume 1, got {}", cell.volume());
        assert!((cell.face_area(2) - 1.0).abs() < 1e-12);
        assert_eq!(cell.face_area(6), 0.0);
    }

    #[test]
    fn test_unused_vertex() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let faces = vec![vec![0, 1, 2], vec![0, 2, 1]];
        let err = Cell::new(7, [0.25, 0.25, 0.25], vertices, faces).unwrap_err();
        match err {
            SceneError::UnusedVertices { cell, max_index, vertex_count } => {
                assert_eq!(cell, 7);
                assert_eq!(max_index, 2);
                assert_eq!(vertex_count, 4);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unreferenced_interior_vertex() {
        // Vertex 2 lies below the highest index but no face uses it
        let vertices = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [5.0, 5.0, 5.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let faces = vec![vec![0, 1, 3], vec![0, 3, 4], vec![0, 4, 1], vec![1, 4, 3]];
        let err = Cell::new(3, [0.25, 0.25, 0.25], vertices, faces).unwrap_err();
        assert!(err.is_structural_error());
        assert_eq!(err.cell(), Some(3));
        assert!(
            matches!(err, SceneError::UnreferencedVertex { cell: 3, vertex: 2 }),
            "Expected vertex 2 to be reported, got {err:?}"
        );
    }

    #[test]
    fn test_index_out_of_range() {
        let (vertices, mut faces) = unit_cube();
        faces[3] = vec![2, 3, 8, 6];
        let err = Cell::new(1, [0.5, 0.5, 0.5], vertices, faces).unwrap_err();
        assert!(matches!(err, SceneError::FaceIndexOutOfRange { cell: 1, face: 3, index: 8, vertex_count: 8 }));
    }

    #[test]
    fn test_degenerate_face() {
        let (vertices, mut faces) = unit_cube();
        faces.push(vec![0, 6]);
        let err = Cell::new(2, [0.5, 0.5, 0.5], vertices, faces).unwrap_err();
        assert!(matches!(err, SceneError::DegenerateFace { cell: 2, face: 6, len: 2 }));
    }

    #[test]
    fn test_build_cells_length_mismatch() {
        let (vertices, faces) = unit_cube();
        let err = build_cells(
            vec![vertices.clone(); 5],
            vec![faces.clone(); 5],
            vec![[0.5, 0.5, 0.5]; 4],
        )
        .unwrap_err();
        assert!(err.is_structural_error());
        assert!(matches!(err, SceneError::CellCountMismatch { vertices: 5, faces: 5, centroids: 4 }));
        assert!(err.to_string().contains("4 centroids"));
    }

    #[test]
    fn test_build_cells_keeps_order() {
        let (vertices, faces) = unit_cube();
        let cells = build_cells(
            vec![vertices.clone(); 3],
            vec![faces.clone(); 3],
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
        )
        .unwrap();
        assert_eq!(cells.len(), 3);
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(cell.id(), i);
            assert_eq!(cell.centroid()[0], i as f64);
        }
    }
}
