//! Provides the binary STL loader and writer.
//!
//! Layout (little-endian): an 80-byte header that is ignored, a signed 32-bit
//! triangle count, then one 50-byte record per triangle: normal and three
//! vertices as twelve `f32`, followed by a `u16` attribute word.

use std::io::{self, Cursor, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{BoundingBox, DecodeError, Encoding, FormatLoader, LoadResult, Mesh, Triangle, Vec3};

/// Size of the free-form header.
pub const HEADER_LEN: usize = 80;

/// Size of one triangle record including the attribute word.
pub const RECORD_LEN: usize = 50;

/// The binary STL loader.
pub struct StlBinaryLoader;

impl FormatLoader for StlBinaryLoader {
    fn encoding(&self) -> Encoding {
        Encoding::Binary
    }

    fn load_from_bytes(&self, data: &[u8]) -> LoadResult {
        parse_binary(data)
    }
}

/// Decodes binary STL.
///
/// The declared count is checked against the bytes actually present before
/// any record is read, so a truncated file never yields a partial mesh.
///
/// # Errors
/// Returns an error if the header is cut short, the count is negative or
/// exceeds the records present, or the count is zero.
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::{stl_binary, DecodeError};
///
/// let mut data = vec![0u8; 80];
/// data.extend_from_slice(&10i32.to_le_bytes());
/// data.extend_from_slice(&[0u8; 50 * 3]);
///
/// let err = stl_binary::parse_binary(&data).unwrap_err();
/// assert!(matches!(err, DecodeError::Truncated { declared: 10, available: 3 }));
/// ```
pub fn parse_binary(data: &[u8]) -> LoadResult {
    if data.len() < HEADER_LEN + 4 {
        return Err(DecodeError::HeaderTooShort(data.len()));
    }

    let mut cursor = Cursor::new(&data[HEADER_LEN..]);
    let count = cursor.read_i32::<LittleEndian>()?;
    if count < 0 {
        return Err(DecodeError::InvalidTriangleCount(count));
    }

    let declared = count as usize;
    let available = (data.len() - HEADER_LEN - 4) / RECORD_LEN;
    if available < declared {
        return Err(DecodeError::Truncated {
            declared: declared as u64,
            available: available as u64,
        });
    }
    if declared == 0 {
        return Err(DecodeError::NoGeometry);
    }

    let mut triangles = Vec::with_capacity(declared);
    let mut bounds = BoundingBox::EMPTY;

    for _ in 0..declared {
        let normal = read_vec3(&mut cursor)?;
        let mut verts = [[0.0; 3]; 3];
        for vert in &mut verts {
            *vert = read_vec3(&mut cursor)?;
            bounds.include(*vert);
        }
        let _attributes = cursor.read_u16::<LittleEndian>()?;

        triangles.push(Triangle { normal, verts });
    }

    Ok(Mesh { triangles, bounds })
}

fn read_vec3(cursor: &mut Cursor<&[u8]>) -> io::Result<Vec3> {
    let mut v = [0.0; 3];
    cursor.read_f32_into::<LittleEndian>(&mut v)?;
    Ok(v)
}

/// Writes `mesh` as binary STL with a zero-padded `header` and zero attributes.
///
/// Headers longer than 80 bytes are cut.
///
/// # Errors
/// Returns an error if the writer fails or the mesh has more triangles than
/// an `i32` count can declare.
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::{stl_binary, Mesh, Triangle};
///
/// let mesh = Mesh::from_triangles(vec![Triangle {
///     normal: [0.0, 0.0, 1.0],
///     verts: [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
/// }]);
/// let mut out = Vec::new();
/// stl_binary::write_binary(&mesh, b"made by hand", &mut out).unwrap();
/// assert_eq!(out.len(), 80 + 4 + 50);
/// ```
pub fn write_binary<W: Write>(mesh: &Mesh, header: &[u8], mut writer: W) -> io::Result<()> {
    let mut head = [0u8; HEADER_LEN];
    let len = header.len().min(HEADER_LEN);
    head[..len].copy_from_slice(&header[..len]);
    writer.write_all(&head)?;

    let count = i32::try_from(mesh.triangles.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many triangles"))?;
    writer.write_i32::<LittleEndian>(count)?;

    for tri in &mesh.triangles {
        for v in std::iter::once(&tri.normal).chain(tri.verts.iter()) {
            for c in v {
                writer.write_f32::<LittleEndian>(*c)?;
            }
        }
        writer.write_u16::<LittleEndian>(0)?;
    }
    writer.flush()
}
