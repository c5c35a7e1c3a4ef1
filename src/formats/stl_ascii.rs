//! Provides the ASCII STL loader and writer.
//!
//! The reader is line-oriented and permissive: unknown lines are skipped,
//! `outer loop`/`endloop` are accepted anywhere, and `endsolid` is optional.
//! Only the data itself is checked: numbers must parse and every facet must
//! end up with exactly three vertices.
//!
//! # Examples
//! ```
//! use stl_thumbnail::formats::{stl_ascii::StlAsciiLoader, FormatLoader};
//!
//! let stl = b"solid t
//!   facet normal 0 0 1
//!     outer loop
//!       vertex 0 0 0
//!       vertex 1 0 0
//!       vertex 0 1 0
//!     endloop
//!   endfacet
//! endsolid t
//! ";
//! let mesh = StlAsciiLoader.load_from_bytes(stl).unwrap();
//! assert_eq!(mesh.triangles.len(), 1);
//! assert_eq!(mesh.bounds.max, [1.0, 1.0, 0.0]);
//! ```

use std::io::{self, BufRead, Write};

use super::{BoundingBox, DecodeError, Encoding, FormatLoader, LoadResult, Mesh, Triangle, Vec3};

/// The five bytes that mark a file as ASCII STL.
pub const MAGIC: &[u8] = b"solid";

/// The ASCII STL loader.
pub struct StlAsciiLoader;

impl FormatLoader for StlAsciiLoader {
    fn encoding(&self) -> Encoding {
        Encoding::Ascii
    }

    fn load_from_bytes(&self, data: &[u8]) -> LoadResult {
        parse_ascii(data)
    }
}

/// A facet that has been opened but not yet turned into a [`Triangle`].
struct OpenFacet {
    normal: Vec3,
    verts: Vec<Vec3>,
}

impl OpenFacet {
    fn finish(self, line: usize) -> Result<Triangle, DecodeError> {
        match self.verts[..] {
            [v0, v1, v2] => Ok(Triangle {
                normal: self.normal,
                verts: [v0, v1, v2],
            }),
            _ => Err(DecodeError::IncompleteFacet { line }),
        }
    }
}

/// Decodes ASCII STL from any buffered reader.
///
/// # Errors
/// Returns an error on unreadable input, bad numbers, malformed facets, or a
/// file without any facet.
pub fn parse_ascii<R: BufRead>(mut reader: R) -> LoadResult {
    let mut triangles = Vec::new();
    let mut bounds = BoundingBox::EMPTY;
    let mut current: Option<OpenFacet> = None;

    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let line = String::from_utf8_lossy(&buf);
        let mut words = line.split_whitespace();
        let Some(keyword) = words.next() else {
            continue;
        };

        match keyword {
            "facet" => {
                // Previous facet without `endfacet`
                if let Some(open) = current.take() {
                    triangles.push(open.finish(line_no)?);
                }
                // Token after `facet` is normally `normal`; not checked
                let _ = words.next();
                let normal = parse_vec3(&mut words, line_no, "facet normal")?;
                current = Some(OpenFacet {
                    normal,
                    verts: Vec::with_capacity(3),
                });
            }
            // Loop delimiters may appear anywhere
            "outer" | "endloop" => {}
            "vertex" => {
                let v = parse_vec3(&mut words, line_no, "vertex")?;
                let open = current
                    .as_mut()
                    .ok_or(DecodeError::VertexOutsideFacet { line: line_no })?;
                if open.verts.len() == 3 {
                    return Err(DecodeError::TooManyVertices { line: line_no });
                }
                bounds.include(v);
                open.verts.push(v);
            }
            "endfacet" => {
                if let Some(open) = current.take() {
                    triangles.push(open.finish(line_no)?);
                }
            }
            _ => {}
        }
    }

    if let Some(open) = current.take() {
        triangles.push(open.finish(line_no)?);
    }

    if triangles.is_empty() {
        return Err(DecodeError::NoGeometry);
    }

    Ok(Mesh { triangles, bounds })
}

fn parse_vec3<'a, I>(
    words: &mut I,
    line: usize,
    keyword: &'static str,
) -> Result<Vec3, DecodeError>
where
    I: Iterator<Item = &'a str>,
{
    let mut v = [0.0; 3];
    for slot in &mut v {
        let token = words.next().ok_or(DecodeError::MissingToken { line, keyword })?;
        *slot = token.parse().map_err(|_| DecodeError::InvalidNumber {
            line,
            token: token.to_string(),
        })?;
    }
    Ok(v)
}

/// Writes `mesh` as ASCII STL under the given solid name.
///
/// Coordinates use the shortest representation that parses back to the same
/// `f32`, so reading the output again reproduces the mesh exactly.
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::{stl_ascii, Mesh, Triangle};
///
/// let mesh = Mesh::from_triangles(vec![Triangle {
///     normal: [0.0, 0.0, 1.0],
///     verts: [[0.0, 0.0, 0.0], [1.5, 0.0, 0.0], [0.0, 1.0, 0.0]],
/// }]);
/// let mut out = Vec::new();
/// stl_ascii::write_ascii(&mesh, "part", &mut out).unwrap();
///
/// let text = String::from_utf8(out).unwrap();
/// assert!(text.starts_with("solid part\n"));
/// assert!(text.contains("vertex 1.5 0 0"));
/// ```
pub fn write_ascii<W: Write>(mesh: &Mesh, name: &str, mut writer: W) -> io::Result<()> {
    writeln!(writer, "solid {}", name)?;
    for tri in &mesh.triangles {
        let [nx, ny, nz] = tri.normal;
        writeln!(writer, "  facet normal {} {} {}", nx, ny, nz)?;
        writeln!(writer, "    outer loop")?;
        for [x, y, z] in tri.verts {
            writeln!(writer, "      vertex {} {} {}", x, y, z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {}", name)?;
    writer.flush()
}
