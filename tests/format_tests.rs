//! Integration tests for STL decoding.
//!
//! Fixtures are generated in memory (or in the system temp directory), so no
//! model files are needed.

use std::path::PathBuf;

use stl_thumbnail::formats::{
    self, stl_ascii, stl_binary, BoundingBox, DecodeError, Encoding, FormatLoader, Mesh, Triangle,
};

/// Axis-aligned cube centered at `center`, two triangles per face.
fn cube(center: [f32; 3], half: f32) -> Mesh {
    let [cx, cy, cz] = center;
    let p = |x: f32, y: f32, z: f32| [cx + x * half, cy + y * half, cz + z * half];
    let mut triangles = Vec::new();
    let mut face = |normal: [f32; 3], a, b, c, d| {
        triangles.push(Triangle {
            normal,
            verts: [a, b, c],
        });
        triangles.push(Triangle {
            normal,
            verts: [a, c, d],
        });
    };
    face([0.0, 0.0, 1.0], p(-1.0, -1.0, 1.0), p(1.0, -1.0, 1.0), p(1.0, 1.0, 1.0), p(-1.0, 1.0, 1.0));
    face([0.0, 0.0, -1.0], p(-1.0, -1.0, -1.0), p(-1.0, 1.0, -1.0), p(1.0, 1.0, -1.0), p(1.0, -1.0, -1.0));
    face([1.0, 0.0, 0.0], p(1.0, -1.0, -1.0), p(1.0, 1.0, -1.0), p(1.0, 1.0, 1.0), p(1.0, -1.0, 1.0));
    face([-1.0, 0.0, 0.0], p(-1.0, -1.0, -1.0), p(-1.0, -1.0, 1.0), p(-1.0, 1.0, 1.0), p(-1.0, 1.0, -1.0));
    face([0.0, 1.0, 0.0], p(-1.0, 1.0, -1.0), p(-1.0, 1.0, 1.0), p(1.0, 1.0, 1.0), p(1.0, 1.0, -1.0));
    face([0.0, -1.0, 0.0], p(-1.0, -1.0, -1.0), p(1.0, -1.0, -1.0), p(1.0, -1.0, 1.0), p(-1.0, -1.0, 1.0));
    Mesh::from_triangles(triangles)
}

/// Triangles with irregular coordinates (deterministic LCG).
fn scattered(count: usize) -> Mesh {
    let mut state: u32 = 0x1234_5678;
    let mut next = move || {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (state >> 8) as f32 / (1u32 << 24) as f32 * 200.0 - 100.0
    };
    let triangles = (0..count)
        .map(|_| Triangle {
            normal: [next(), next(), next()],
            verts: [
                [next(), next(), next()],
                [next(), next(), next()],
                [next(), next(), next()],
            ],
        })
        .collect();
    Mesh::from_triangles(triangles)
}

fn ascii_bytes(mesh: &Mesh) -> Vec<u8> {
    let mut out = Vec::new();
    stl_ascii::write_ascii(mesh, "fixture", &mut out).unwrap();
    out
}

fn binary_bytes(mesh: &Mesh, header: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    stl_binary::write_binary(mesh, header, &mut out).unwrap();
    out
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("stl-thumbnail-{}-{}", std::process::id(), name))
}

fn assert_tight_bounds(mesh: &Mesh) {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for tri in &mesh.triangles {
        for v in &tri.verts {
            assert!(mesh.bounds.contains(*v));
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
        }
    }
    assert_eq!(mesh.bounds.min, min);
    assert_eq!(mesh.bounds.max, max);
}

// ===========================================================================
// Format detection tests
// ===========================================================================

#[test]
fn test_solid_prefix_selects_ascii_loader() {
    let data = ascii_bytes(&cube([0.0; 3], 1.0));
    assert_eq!(Encoding::detect(&data), Encoding::Ascii);
    assert_eq!(formats::find_loader(&data).encoding(), Encoding::Ascii);
}

#[test]
fn test_other_prefix_selects_binary_loader() {
    let data = binary_bytes(&cube([0.0; 3], 1.0), b"exported by some CAD tool");
    assert_eq!(Encoding::detect(&data), Encoding::Binary);
    assert_eq!(formats::find_loader(&data).encoding(), Encoding::Binary);
    assert_eq!(formats::load_mesh(&data).unwrap().triangles.len(), 12);
}

#[test]
fn test_binary_with_solid_header_is_misread_as_ascii() {
    // Known ambiguity: the sniff only looks at the first five bytes
    let mesh = cube([0.0; 3], 1.0);
    let data = binary_bytes(&mesh, b"solid model exported as binary");
    assert_eq!(Encoding::detect(&data), Encoding::Ascii);

    let result = formats::load_mesh(&data);
    assert!(matches!(result, Err(DecodeError::NoGeometry)));

    // The binary loader itself would have read it fine
    let direct = stl_binary::StlBinaryLoader.load_from_bytes(&data).unwrap();
    assert_eq!(direct, mesh);
}

// ===========================================================================
// ASCII decoding
// ===========================================================================

#[test]
fn test_ascii_triangle_count_matches_facet_keywords() {
    let mesh = scattered(37);
    let data = ascii_bytes(&mesh);
    let text = String::from_utf8(data.clone()).unwrap();
    let facets = text
        .lines()
        .filter(|line| line.split_whitespace().next() == Some("facet"))
        .count();

    let decoded = formats::load_mesh(&data).unwrap();
    assert_eq!(facets, 37);
    assert_eq!(decoded.triangles.len(), facets);
}

#[test]
fn test_ascii_minimal_file_without_endsolid() {
    let data = b"solid\nfacet normal 0 0 1\nouter loop\nvertex 1 2 3\nvertex 4 5 6\nvertex 7 8 -9\nendloop\nendfacet";
    let mesh = formats::load_mesh(data).unwrap();
    assert_eq!(
        mesh.triangles,
        vec![Triangle {
            normal: [0.0, 0.0, 1.0],
            verts: [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, -9.0]],
        }]
    );
    assert_eq!(mesh.bounds.min, [1.0, 2.0, -9.0]);
    assert_eq!(mesh.bounds.max, [7.0, 8.0, 6.0]);
}

#[test]
fn test_ascii_non_numeric_token_is_an_error() {
    let data = b"solid x\nfacet normal 0 0 one\n";
    let result = formats::load_mesh(data);
    assert!(matches!(result, Err(DecodeError::InvalidNumber { line: 2, .. })));
}

#[test]
fn test_ascii_round_trip_is_exact() {
    let mesh = scattered(25);
    let decoded = formats::load_mesh(&ascii_bytes(&mesh)).unwrap();
    assert_eq!(decoded, mesh);
}

// ===========================================================================
// Binary decoding
// ===========================================================================

#[test]
fn test_binary_count_and_order() {
    let mesh = scattered(10);
    let decoded = formats::load_mesh(&binary_bytes(&mesh, b"")).unwrap();
    assert_eq!(decoded.triangles.len(), 10);
    for (expected, actual) in mesh.triangles.iter().zip(&decoded.triangles) {
        assert_eq!(expected, actual);
    }
}

#[test]
fn test_binary_round_trip_is_bit_identical() {
    let original = binary_bytes(&scattered(16), b"round trip");
    let decoded = formats::load_mesh(&original).unwrap();
    assert_eq!(binary_bytes(&decoded, b"round trip"), original);
}

#[test]
fn test_binary_truncated_file_yields_no_mesh() {
    let mut data = binary_bytes(&scattered(3), b"");
    data[80..84].copy_from_slice(&10i32.to_le_bytes());

    let result = formats::load_mesh(&data);
    assert!(matches!(
        result,
        Err(DecodeError::Truncated {
            declared: 10,
            available: 3
        })
    ));
}

// ===========================================================================
// Bounding box
// ===========================================================================

#[test]
fn test_bounds_are_tight_for_both_encodings() {
    let mesh = scattered(50);
    let from_ascii = formats::load_mesh(&ascii_bytes(&mesh)).unwrap();
    let from_binary = formats::load_mesh(&binary_bytes(&mesh, b"")).unwrap();

    assert_tight_bounds(&from_ascii);
    assert_tight_bounds(&from_binary);
    assert_eq!(from_ascii.bounds, from_binary.bounds);
}

#[test]
fn test_bounds_are_stable_across_decodes() {
    let data = binary_bytes(&cube([3.0, -2.0, 7.5], 4.0), b"");
    let first = formats::load_mesh(&data).unwrap();
    let second = formats::load_mesh(&data).unwrap();
    assert_eq!(first.bounds, second.bounds);
    assert_eq!(
        first.bounds,
        BoundingBox {
            min: [-1.0, -6.0, 3.5],
            max: [7.0, 2.0, 11.5],
        }
    );
}

// ===========================================================================
// Empty meshes
// ===========================================================================

#[test]
fn test_empty_meshes_are_rejected() {
    let empty = Mesh::from_triangles(vec![]);
    assert!(matches!(
        formats::load_mesh(&ascii_bytes(&empty)),
        Err(DecodeError::NoGeometry)
    ));
    assert!(matches!(
        formats::load_mesh(&binary_bytes(&empty, b"")),
        Err(DecodeError::NoGeometry)
    ));
    assert!(matches!(formats::load_mesh(b""), Err(DecodeError::HeaderTooShort(0))));
}

// ===========================================================================
// Path loading
// ===========================================================================

#[test]
fn test_load_from_path() {
    let path = temp_path("cube.stl");
    std::fs::write(&path, ascii_bytes(&cube([0.0; 3], 2.0))).unwrap();

    let mesh = formats::load_mesh_from_path(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(mesh.triangles.len(), 12);
    assert_eq!(mesh.bounds.max, [2.0, 2.0, 2.0]);
}

#[test]
fn test_missing_file_is_io_error() {
    let result = formats::load_mesh_from_path(&temp_path("missing.stl"));
    assert!(matches!(result, Err(DecodeError::Io(_))));
}
