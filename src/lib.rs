//! Renders thumbnail previews of STL meshes.
//!
//! A mesh is decoded from ASCII or binary STL, framed by a camera derived
//! from its bounding box, drawn with a single point light over a floor and a
//! reference grid by a software rasterizer, and written out as PNG.
//!
//! # Build
//! ```text
//! cargo build --release
//! ```
//!
//! # Examples
//! ```
//! use stl_thumbnail::formats::{Mesh, Triangle};
//!
//! let mesh = Mesh::from_triangles(vec![Triangle {
//!     normal: [0.0, 0.0, 1.0],
//!     verts: [[-5.0, -5.0, 0.0], [5.0, -5.0, 0.0], [0.0, 5.0, 5.0]],
//! }]);
//! let raster = stl_thumbnail::render_thumbnail(&mesh, 32).unwrap();
//! assert_eq!(raster.data.len(), 32 * 32 * 3);
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod formats;
pub mod renderer;
pub mod scene;

pub use error::ThumbnailError;

use capture::RgbRaster;
use config::Config;
use formats::{DecodeError, Encoding, Mesh};
use renderer::SoftwareRenderer;

/// What [`render_to_file`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub encoding: Encoding,
    pub triangles: usize,
}

/// Renders one `size` x `size` frame of `mesh` and returns it top row first.
///
/// # Errors
/// Returns an error if no camera can be derived from the mesh bounds or the
/// viewport is empty.
pub fn render_thumbnail(mesh: &Mesh, size: u32) -> Result<RgbRaster, ThumbnailError> {
    let params = scene::compose(mesh)?;
    let mut renderer = SoftwareRenderer::new(size, size)?;
    scene::render(&params, mesh, &mut renderer);
    Ok(capture::capture(&renderer)?)
}

/// Decodes `config.input`, renders it and writes a PNG to `config.output`.
///
/// Nothing is written unless decoding and rendering both succeed.
///
/// # Errors
/// Returns the first decode, scene, render or write failure.
///
/// # Examples
/// ```
/// use stl_thumbnail::config::Config;
///
/// let config = Config::from_args(["-i", "does_not_exist.stl", "-o", "out.png"]).unwrap();
/// assert!(stl_thumbnail::render_to_file(&config).is_err());
/// ```
pub fn render_to_file(config: &Config) -> Result<RenderSummary, ThumbnailError> {
    let data = std::fs::read(&config.input).map_err(DecodeError::from)?;
    let encoding = Encoding::detect(&data);
    let mesh = formats::load_mesh(&data)?;

    let raster = render_thumbnail(&mesh, config.size)?;
    raster.save_png(&config.output)?;

    Ok(RenderSummary {
        encoding,
        triangles: mesh.triangles.len(),
    })
}
