//! Parsers for the text exports a tessellation is delivered in.
//!
//! Each resource has its own positional format, so each gets its own entry
//! point rather than one configurable reader:
//!
//! - [`parse_points`]: `id x y z` per line, the id column is dropped.
//! - [`parse_polylines`]: `x y z` per line, blocks separated by blank lines.
//! - [`parse_bracketed_rows`]: one cell per line, space separated groups such
//!   as `(x,y,z)` or `(0,1,2,3)`.
//! - [`parse_centroids`]: `x y z` per line.
//!
//! Numeric fields that fail to parse are reported, never defaulted.

use crate::cell::Point3;
use crate::error::{Resource, SceneError, SceneResult};

/// Rows of the bracketed and flat-column formats with this many entries or
/// fewer carry no cell data.
pub const MIN_ROW_LEN: usize = 3;

/// How the fields of a bracketed row are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberKind {
    /// Non-negative integers, used for face vertex indices.
    Integer,
    /// Finite floating-point numbers, used for coordinates.
    Float,
}

/// Output of [`parse_bracketed_rows`]: rows of groups of numbers.
#[derive(Clone, Debug, PartialEq)]
pub enum BracketedRows {
    Integer(Vec<Vec<Vec<usize>>>),
    Float(Vec<Vec<Vec<f64>>>),
}

impl BracketedRows {
    pub fn len(&self) -> usize {
        match self {
            BracketedRows::Integer(rows) => rows.len(),
            BracketedRows::Float(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

trait Field: Sized {
    fn parse_field(s: &str) -> Option<Self>;
}

impl Field for f64 {
    fn parse_field(s: &str) -> Option<Self> {
        s.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl Field for usize {
    fn parse_field(s: &str) -> Option<Self> {
        s.parse::<usize>().ok()
    }
}

fn parse_field<T: Field>(resource: Resource, line: usize, field: &str) -> SceneResult<T> {
    T::parse_field(field).ok_or_else(|| SceneError::InvalidNumber {
        resource,
        line,
        field: field.to_string(),
    })
}

fn to_point(resource: Resource, line: usize, values: &[f64]) -> SceneResult<Point3> {
    match values {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(SceneError::FieldCount {
            resource,
            line,
            expected: 3,
            actual: values.len(),
        }),
    }
}

fn parse_coordinates<'a, I>(resource: Resource, line: usize, fields: I) -> SceneResult<Point3>
where
    I: Iterator<Item = &'a str>,
{
    let values = fields
        .map(|f| parse_field::<f64>(resource, line, f))
        .collect::<SceneResult<Vec<f64>>>()?;
    to_point(resource, line, &values)
}

/// Parses generator points, one `id x y z` line per point.
///
/// The leading id column is a line tag and is discarded, the position in the
/// output is the point id. Blank lines are skipped, a line holding only the id
/// is a field count error.
pub fn parse_points(text: &str) -> SceneResult<Vec<Point3>> {
    let mut points = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let fields = raw.split_whitespace().skip(1);
        points.push(parse_coordinates(Resource::Points, i + 1, fields)?);
    }
    Ok(points)
}

/// Parses wireframe polylines: blocks of `x y z` lines separated by blank lines.
///
/// Blocks that end up without points are dropped.
pub fn parse_polylines(text: &str) -> SceneResult<Vec<Vec<Point3>>> {
    let mut polylines = Vec::new();
    let mut current: Vec<Point3> = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            if !current.is_empty() {
                polylines.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(parse_coordinates(Resource::Edges, i + 1, raw.split_whitespace())?);
    }
    if !current.is_empty() {
        polylines.push(current);
    }
    Ok(polylines)
}

fn strip_brackets(group: &str) -> Option<&str> {
    let mut chars = group.chars();
    let close = match chars.next()? {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        _ => return None,
    };
    if group.len() < 2 || !group.ends_with(close) {
        return None;
    }
    Some(&group[1..group.len() - 1])
}

fn parse_rows<T: Field>(text: &str, resource: Resource) -> SceneResult<Vec<Vec<Vec<T>>>> {
    let mut rows = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let groups: Vec<&str> = raw.split_whitespace().collect();
        if groups.len() <= MIN_ROW_LEN {
            continue;
        }
        let row = groups
            .into_iter()
            .map(|group| {
                let inner = strip_brackets(group).ok_or_else(|| SceneError::Unbracketed {
                    resource,
                    line,
                    group: group.to_string(),
                })?;
                inner
                    .split(',')
                    .map(|f| parse_field::<T>(resource, line, f.trim()))
                    .collect::<SceneResult<Vec<T>>>()
            })
            .collect::<SceneResult<Vec<Vec<T>>>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Parses one-cell-per-line rows of bracketed, comma separated groups.
///
/// Lines with [`MIN_ROW_LEN`] groups or fewer are the exporter's marker for
/// "no cell here" and are dropped.
pub fn parse_bracketed_rows(text: &str, resource: Resource, kind: NumberKind) -> SceneResult<BracketedRows> {
    Ok(match kind {
        NumberKind::Integer => BracketedRows::Integer(parse_rows::<usize>(text, resource)?),
        NumberKind::Float => BracketedRows::Float(parse_rows::<f64>(text, resource)?),
    })
}

/// Parses the per-cell vertex coordinates, one `(x,y,z)` group per vertex.
pub fn parse_cell_vertices(text: &str) -> SceneResult<Vec<Vec<Point3>>> {
    let resource = Resource::CellVertices;
    let rows = parse_rows::<f64>(text, resource)?;

    // Line numbers for errors need the unfiltered position of each row.
    let lines = data_lines(text);
    rows.iter()
        .zip(lines)
        .map(|(row, line)| {
            row.iter()
                .map(|group| to_point(resource, line, group))
                .collect::<SceneResult<Vec<Point3>>>()
        })
        .collect()
}

/// Parses the per-cell face lists, one `(i,j,k,...)` group per face.
pub fn parse_cell_faces(text: &str) -> SceneResult<Vec<Vec<Vec<usize>>>> {
    parse_rows::<usize>(text, Resource::CellFaceIndices)
}

fn data_lines(text: &str) -> impl Iterator<Item = usize> + '_ {
    text.lines()
        .enumerate()
        .filter(|(_, raw)| raw.split_whitespace().count() > MIN_ROW_LEN)
        .map(|(i, _)| i + 1)
}

/// Parses per-cell centroids, one `x y z` line per cell.
///
/// Raw lines of [`MIN_ROW_LEN`] characters or fewer, and whitespace-only
/// lines, are dropped before splitting.
pub fn parse_centroids(text: &str) -> SceneResult<Vec<Point3>> {
    let mut centroids = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        if raw.len() <= MIN_ROW_LEN || raw.trim().is_empty() {
            continue;
        }
        centroids.push(parse_coordinates(Resource::CellCentroids, i + 1, raw.split_whitespace())?);
    }
    Ok(centroids)
}
