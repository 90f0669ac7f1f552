//! Exploded views: every vertex of a cell moved a fixed distance along the
//! line to its centroid, so neighbouring cells separate visually.

use crate::cell::{Cell, Face, Point3, Triangle, length, sub};
use crate::error::{SceneError, SceneResult};
use rayon::prelude::*;
use serde::Serialize;
use tracing::warn;

/// Centroid-to-vertex distances at or below this cannot be normalized.
pub const DEGENERATE_LENGTH: f64 = 1e-12;

/// Distance used to shrink each cell slightly around its own centroid.
pub const DEFAULT_SHRINK: f64 = 0.01;

/// Distance used for the gap copy that separates neighbouring cells.
pub const DEFAULT_GAP: f64 = 0.1;

/// A displacement policy: move each vertex `distance` towards its centroid.
///
/// Negative distances push vertices away from the centroid instead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Explosion {
    distance: f64,
}

impl Explosion {
    pub fn new(distance: f64) -> SceneResult<Self> {
        if !distance.is_finite() {
            return Err(SceneError::InvalidDistance(distance));
        }
        Ok(Self { distance })
    }

    /// Fixed-length pull towards the centroid that shrinks each cell in place.
    pub fn shrink() -> Self {
        Self { distance: DEFAULT_SHRINK }
    }

    /// Uniform offset for the separate copy rendered with gaps between cells.
    pub fn gap() -> Self {
        Self { distance: DEFAULT_GAP }
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Displaces one vertex, or returns `None` when it sits on the centroid.
    pub fn displace(&self, vertex: Point3, centroid: Point3) -> Option<Point3> {
        let d = sub(centroid, vertex);
        let len = length(d);
        if len <= DEGENERATE_LENGTH || !len.is_finite() {
            return None;
        }
        let s = self.distance / len;
        Some([vertex[0] + d[0] * s, vertex[1] + d[1] * s, vertex[2] + d[2] * s])
    }

    /// Exploded copy of one cell. The source cell is left untouched.
    pub fn apply<'a>(&self, cell: &'a Cell) -> ExplodedCell<'a> {
        let mut degenerate = Vec::new();
        let vertices = cell
            .vertices()
            .iter()
            .enumerate()
            .map(|(i, &v)| match self.displace(v, cell.centroid()) {
                Some(moved) => moved,
                None => {
                    warn!(cell = cell.id(), vertex = i, "vertex coincides with centroid, left in place");
                    degenerate.push(DegenerateVertex { cell: cell.id(), vertex: i });
                    v
                }
            })
            .collect();

        ExplodedCell {
            source: cell,
            vertices,
            degenerate,
        }
    }

    /// Exploded copies of all cells, in source order.
    pub fn apply_all<'a>(&self, cells: &'a [Cell]) -> Vec<ExplodedCell<'a>> {
        cells.par_iter().map(|cell| self.apply(cell)).collect()
    }
}

impl Default for Explosion {
    fn default() -> Self {
        Self::shrink()
    }
}

/// A vertex that could not be displaced because it coincides with its centroid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DegenerateVertex {
    pub cell: usize,
    pub vertex: usize,
}

/// A cell with displaced vertex positions.
///
/// Topology and centroid are borrowed from the source cell and never change.
#[derive(Clone, Debug)]
pub struct ExplodedCell<'a> {
    source: &'a Cell,
    vertices: Vec<Point3>,
    degenerate: Vec<DegenerateVertex>,
}

impl<'a> ExplodedCell<'a> {
    pub fn source(&self) -> &'a Cell {
        self.source
    }

    pub fn id(&self) -> usize {
        self.source.id()
    }

    pub fn centroid(&self) -> Point3 {
        self.source.centroid()
    }

    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    pub fn faces(&self) -> &'a [Face] {
        self.source.faces()
    }

    pub fn triangles(&self) -> Vec<Triangle> {
        self.source.triangles()
    }

    /// Vertices that were left in place.
    pub fn degenerate(&self) -> &[DegenerateVertex] {
        &self.degenerate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetra(centroid: Point3) -> Cell {
        let vertices = vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [-1.0, -1.0, -1.0]];
        let faces = vec![vec![0, 1, 2], vec![0, 3, 1], vec![1, 3, 2], vec![2, 3, 0]];
        Cell::new(0, centroid, vertices, faces).unwrap()
    }

    #[test]
    fn test_displace_towards_centroid() {
        let e = Explosion::new(0.1).unwrap();
        let v = e.displace([1.0, 0.0, 0.0], [0.0, 0.0, 0.0]).unwrap();
        assert!((v[0] - 0.9).abs() < 1e-12);
        assert_eq!(v[1], 0.0);
        assert_eq!(v[2], 0.0);
    }

    #[test]
    fn test_displace_is_fixed_length() {
        let e = Explosion::shrink();
        let centroid = [2.0, -1.0, 3.0];
        for v in [[12.0, -1.0, 3.0], [2.5, -0.5, 3.0], [-40.0, 7.0, 11.0]] {
            let moved = e.displace(v, centroid).unwrap();
            let before = length(sub(v, centroid));
            let after = length(sub(moved, centroid));
            assert!((before - after - DEFAULT_SHRINK).abs() < 1e-9, "moved {} instead of {}", before - after, DEFAULT_SHRINK);
        }
    }

    #[test]
    fn test_negative_distance_pushes_outward() {
        let e = Explosion::new(-0.5).unwrap();
        let v = e.displace([0.0, 2.0, 0.0], [0.0, 0.0, 0.0]).unwrap();
        assert!((v[1] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_distance() {
        assert!(matches!(Explosion::new(f64::NAN), Err(SceneError::InvalidDistance(_))));
        assert!(Explosion::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_apply_keeps_source_and_topology() {
        let cell = tetra([0.0, 0.0, 0.0]);
        let exploded = Explosion::gap().apply(&cell);
        assert_eq!(exploded.vertices().len(), cell.vertices().len());
        assert_eq!(exploded.faces(), cell.faces());
        assert_eq!(exploded.centroid(), cell.centroid());
        assert_eq!(cell.vertices()[0], [1.0, 0.0, 0.0]);
        assert!((exploded.vertices()[0][0] - 0.9).abs() < 1e-12);
        assert!(exploded.degenerate().is_empty());
    }

    #[test]
    fn test_coincident_vertex_left_in_place() {
        let cell = tetra([0.0, 1.0, 0.0]);
        let exploded = Explosion::gap().apply(&cell);
        assert_eq!(exploded.vertices()[1], [0.0, 1.0, 0.0]);
        assert_eq!(exploded.degenerate(), &[DegenerateVertex { cell: 0, vertex: 1 }]);
        assert!(exploded.vertices().iter().all(|v| v.iter().all(|c| c.is_finite())));
    }
}
