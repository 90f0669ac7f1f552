//! Error types for scene ingestion.

use std::fmt;
use thiserror::Error;

/// Result type for scene ingestion.
pub type SceneResult<T> = Result<T, SceneError>;

/// The five text resources a scene is reconstructed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Generator points, point-list format.
    Points,
    /// Wireframe edges, polyline-block format.
    Edges,
    /// Per-cell vertex coordinates, bracketed-row format with floats.
    CellVertices,
    /// Per-cell face vertex indices, bracketed-row format with integers.
    CellFaceIndices,
    /// Per-cell centroids, flat-column format.
    CellCentroids,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Points,
        Resource::Edges,
        Resource::CellVertices,
        Resource::CellFaceIndices,
        Resource::CellCentroids,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Points => "points",
            Resource::Edges => "edges",
            Resource::CellVertices => "cell-vertices",
            Resource::CellFaceIndices => "cell-face-indices",
            Resource::CellCentroids => "cell-centroids",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors that abort loading a scene.
///
/// Line numbers are 1-based positions in the source text. Cell indices count
/// cells in source order after malformed rows have been dropped.
#[derive(Debug, Error)]
pub enum SceneError {
    /// A resource could not be retrieved.
    #[error("failed to fetch {resource} from {location}: {source}")]
    Fetch {
        resource: Resource,
        location: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A field that should hold a number does not.
    #[error("{resource} line {line}: cannot parse {field:?} as a number")]
    InvalidNumber {
        resource: Resource,
        line: usize,
        field: String,
    },

    /// A row or group has the wrong number of fields.
    #[error("{resource} line {line}: expected {expected} fields, got {actual}")]
    FieldCount {
        resource: Resource,
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// A group of a bracketed row is not wrapped in a delimiter pair.
    #[error("{resource} line {line}: group {group:?} is not wrapped in brackets")]
    Unbracketed {
        resource: Resource,
        line: usize,
        group: String,
    },

    /// The three cell-aligned resources disagree on the number of cells.
    #[error(
        "cell count mismatch: {vertices} vertex rows, {faces} face rows, {centroids} centroids"
    )]
    CellCountMismatch {
        vertices: usize,
        faces: usize,
        centroids: usize,
    },

    /// A cell has no faces at all.
    #[error("cell {cell} has no faces")]
    EmptyCell { cell: usize },

    /// A face has fewer than three vertices.
    #[error("cell {cell} face {face} has {len} vertices, at least 3 are required")]
    DegenerateFace { cell: usize, face: usize, len: usize },

    /// A face references a vertex the cell does not declare.
    #[error("cell {cell} face {face} references vertex {index}, cell has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        cell: usize,
        face: usize,
        index: usize,
        vertex_count: usize,
    },

    /// Some declared vertices are never referenced by a face.
    #[error("cell {cell}: highest face index is {max_index} but cell has {vertex_count} vertices")]
    UnusedVertices {
        cell: usize,
        max_index: usize,
        vertex_count: usize,
    },

    /// A vertex below the highest face index is never referenced by a face.
    #[error("cell {cell}: vertex {vertex} is not used by any face")]
    UnreferencedVertex { cell: usize, vertex: usize },

    /// An explosion distance is NaN or infinite.
    #[error("invalid explosion distance: {0}")]
    InvalidDistance(f64),
}

impl SceneError {
    /// Whether the error comes from a malformed field rather than cross-resource structure.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            SceneError::InvalidNumber { .. } | SceneError::FieldCount { .. } | SceneError::Unbracketed { .. }
        )
    }

    /// Whether the error is a violated cross-resource or per-cell invariant.
    pub fn is_structural_error(&self) -> bool {
        matches!(
            self,
            SceneError::CellCountMismatch { .. }
                | SceneError::EmptyCell { .. }
                | SceneError::DegenerateFace { .. }
                | SceneError::FaceIndexOutOfRange { .. }
                | SceneError::UnusedVertices { .. }
                | SceneError::UnreferencedVertex { .. }
        )
    }

    /// The offending cell, for structural errors scoped to one cell.
    pub fn cell(&self) -> Option<usize> {
        match self {
            SceneError::EmptyCell { cell }
            | SceneError::DegenerateFace { cell, .. }
            | SceneError::FaceIndexOutOfRange { cell, .. }
            | SceneError::UnusedVertices { cell, .. }
            | SceneError::UnreferencedVertex { cell, .. } => Some(*cell),
            _ => None,
        }
    }
}
