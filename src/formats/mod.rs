//! Provides the STL loaders and the triangle-soup mesh types they produce.
//!
//! STL comes in two encodings of the same data: a line-oriented ASCII form
//! and a fixed-layout little-endian binary form. Both loaders implement
//! [`FormatLoader`] and produce a [`Mesh`] whose bounding box is grown vertex
//! by vertex while decoding.
//!
//! # Examples
//! ```
//! use stl_thumbnail::formats;
//!
//! let result = formats::load_mesh(b"not a mesh");
//! assert!(result.is_err());
//! ```

pub mod stl_ascii;
pub mod stl_binary;

use std::path::Path;

use thiserror::Error;

/// A 3D vector type used by the loaders.
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::Vec3;
///
/// let v: Vec3 = [1.0, 2.0, 3.0];
/// assert_eq!(v, [1.0, 2.0, 3.0]);
/// ```
pub type Vec3 = [f32; 3];

/// One facet of the mesh: the stored normal followed by three vertices.
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::Triangle;
///
/// let tri = Triangle {
///     normal: [0.0, 0.0, 1.0],
///     verts: [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
/// };
/// assert_eq!(tri.verts[1], [1.0, 0.0, 0.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Facet normal exactly as stored in the file.
    pub normal: Vec3,
    /// Vertex positions in file order.
    pub verts: [Vec3; 3],
}

/// Axis-aligned bounding box over every decoded vertex.
///
/// Starts at the empty sentinel (`+inf` / `-inf`) and only ever grows.
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::BoundingBox;
///
/// let mut bounds = BoundingBox::EMPTY;
/// assert!(bounds.is_empty());
///
/// bounds.include([1.0, -2.0, 3.0]);
/// bounds.include([-1.0, 2.0, 0.0]);
/// assert_eq!(bounds.min, [-1.0, -2.0, 0.0]);
/// assert_eq!(bounds.max, [1.0, 2.0, 3.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Smallest coordinate seen on each axis.
    pub min: Vec3,
    /// Largest coordinate seen on each axis.
    pub max: Vec3,
}

impl BoundingBox {
    /// The box before any vertex has been observed.
    pub const EMPTY: BoundingBox = BoundingBox {
        min: [f32::INFINITY; 3],
        max: [f32::NEG_INFINITY; 3],
    };

    /// Grows the box so that it contains `v`.
    pub fn include(&mut self, v: Vec3) {
        for axis in 0..3 {
            if v[axis] < self.min[axis] {
                self.min[axis] = v[axis];
            }
            if v[axis] > self.max[axis] {
                self.max[axis] = v[axis];
            }
        }
    }

    /// Returns true while no vertex has been included.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    /// Returns true if `v` lies inside the box (inclusive).
    pub fn contains(&self, v: Vec3) -> bool {
        (0..3).all(|axis| self.min[axis] <= v[axis] && v[axis] <= self.max[axis])
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox::EMPTY
    }
}

/// A decoded triangle soup plus the bounds of all of its vertices.
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::{Mesh, Triangle};
///
/// let mesh = Mesh::from_triangles(vec![Triangle {
///     normal: [0.0, 0.0, 1.0],
///     verts: [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 3.0, 1.0]],
/// }]);
/// assert_eq!(mesh.triangles.len(), 1);
/// assert_eq!(mesh.bounds.max, [2.0, 3.0, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Triangles in file order.
    pub triangles: Vec<Triangle>,
    /// Tightest box around every vertex (normals excluded).
    pub bounds: BoundingBox,
}

impl Mesh {
    /// Builds a mesh from triangles, computing the bounds from their vertices.
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let mut bounds = BoundingBox::EMPTY;
        for tri in &triangles {
            for v in &tri.verts {
                bounds.include(*v);
            }
        }
        Mesh { triangles, bounds }
    }
}

/// Which of the two STL encodings a file was read as.
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::Encoding;
///
/// assert_eq!(Encoding::detect(b"solid cube"), Encoding::Ascii);
/// assert_eq!(Encoding::detect(b"\0\0\0\0\0"), Encoding::Binary);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    Binary,
}

impl Encoding {
    /// Sniffs the first five bytes.
    ///
    /// Anything that starts with `solid` is ASCII, even a binary file whose
    /// free-form header happens to begin with that word.
    pub fn detect(data: &[u8]) -> Encoding {
        if data.starts_with(stl_ascii::MAGIC) {
            Encoding::Ascii
        } else {
            Encoding::Binary
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Ascii => write!(f, "ASCII"),
            Encoding::Binary => write!(f, "binary"),
        }
    }
}

/// The result type for mesh loading.
pub type LoadResult = Result<Mesh, DecodeError>;

/// Errors that can occur while decoding a mesh.
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::DecodeError;
///
/// let err = DecodeError::NoGeometry;
/// assert_eq!(format!("{}", err), "No geometry found");
/// ```
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Binary STL is {0} bytes, too short for header and triangle count")]
    HeaderTooShort(usize),
    #[error("Truncated binary STL: {declared} triangles declared, only {available} present")]
    Truncated { declared: u64, available: u64 },
    #[error("Invalid triangle count: {0}")]
    InvalidTriangleCount(i32),
    #[error("Line {line}: expected a number, found {token:?}")]
    InvalidNumber { line: usize, token: String },
    #[error("Line {line}: `{keyword}` is missing coordinates")]
    MissingToken { line: usize, keyword: &'static str },
    #[error("Line {line}: vertex outside of a facet")]
    VertexOutsideFacet { line: usize },
    #[error("Line {line}: facet has more than three vertices")]
    TooManyVertices { line: usize },
    #[error("Line {line}: facet has fewer than three vertices")]
    IncompleteFacet { line: usize },
    #[error("No geometry found")]
    NoGeometry,
}

/// A trait for the STL encoding loaders.
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::{self, FormatLoader};
///
/// let loader = formats::stl_ascii::StlAsciiLoader;
/// assert_eq!(loader.encoding(), formats::Encoding::Ascii);
/// assert!(loader.can_load(b"solid part"));
/// ```
pub trait FormatLoader {
    /// Returns the encoding this loader handles.
    fn encoding(&self) -> Encoding;

    /// Checks whether this loader should handle the given data.
    ///
    /// Only the leading bytes are inspected; nothing is parsed.
    fn can_load(&self, data: &[u8]) -> bool {
        Encoding::detect(data) == self.encoding()
    }

    /// Loads a mesh from raw bytes.
    ///
    /// # Errors
    /// Returns an error if the data is malformed, truncated, or has no triangles.
    fn load_from_bytes(&self, data: &[u8]) -> LoadResult;
}

/// Returns both STL loaders in detection order.
pub fn get_loaders() -> Vec<Box<dyn FormatLoader>> {
    vec![
        Box::new(stl_ascii::StlAsciiLoader),
        Box::new(stl_binary::StlBinaryLoader),
    ]
}

/// Finds the loader for the given data.
///
/// Anything the ASCII loader refuses is binary, so this never fails.
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::{self, Encoding};
///
/// let loader = formats::find_loader(b"solid x");
/// assert_eq!(loader.encoding(), Encoding::Ascii);
/// ```
pub fn find_loader(data: &[u8]) -> Box<dyn FormatLoader> {
    get_loaders()
        .into_iter()
        .find(|loader| loader.can_load(data))
        .unwrap_or_else(|| Box::new(stl_binary::StlBinaryLoader))
}

/// Loads a mesh from bytes, auto-detecting the encoding.
///
/// # Errors
/// Returns an error if decoding fails or the mesh has no triangles.
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::{self, DecodeError};
///
/// let result = formats::load_mesh(b"solid empty\nendsolid empty\n");
/// assert!(matches!(result, Err(DecodeError::NoGeometry)));
/// ```
pub fn load_mesh(data: &[u8]) -> LoadResult {
    find_loader(data).load_from_bytes(data)
}

/// Loads a mesh from a file path, auto-detecting the encoding.
///
/// # Errors
/// Returns an error if the file cannot be read or decoding fails.
///
/// # Examples
/// ```
/// use std::path::Path;
///
/// use stl_thumbnail::formats;
///
/// let result = formats::load_mesh_from_path(Path::new("does_not_exist.stl"));
/// assert!(result.is_err());
/// ```
pub fn load_mesh_from_path(path: &Path) -> LoadResult {
    let data = std::fs::read(path)?;
    load_mesh(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_box_sentinel() {
        let bounds = BoundingBox::default();
        assert!(bounds.is_empty());
        assert_eq!(bounds.min, [f32::INFINITY; 3]);
        assert_eq!(bounds.max, [f32::NEG_INFINITY; 3]);
        assert!(!bounds.contains([0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_single_vertex_box_is_a_point() {
        let mut bounds = BoundingBox::EMPTY;
        bounds.include([4.0, 5.0, 6.0]);
        assert!(!bounds.is_empty());
        assert_eq!(bounds.min, bounds.max);
        assert!(bounds.contains([4.0, 5.0, 6.0]));
    }

    #[test]
    fn test_detect_requires_exact_prefix() {
        assert_eq!(Encoding::detect(b"solid"), Encoding::Ascii);
        assert_eq!(Encoding::detect(b"Solid"), Encoding::Binary);
        assert_eq!(Encoding::detect(b"soli"), Encoding::Binary);
        assert_eq!(Encoding::detect(b" solid"), Encoding::Binary);
        assert_eq!(Encoding::detect(b""), Encoding::Binary);
    }

    #[test]
    fn test_each_input_has_one_loader() {
        for data in [&b"solid a"[..], &b"\x00\x01"[..]] {
            let matching = get_loaders()
                .iter()
                .filter(|loader| loader.can_load(data))
                .count();
            assert_eq!(matching, 1);
        }
    }
}
