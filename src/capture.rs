//! Reads the finished frame back from a renderer and writes it as PNG.
//!
//! # Examples
//! ```
//! use stl_thumbnail::capture::RgbRaster;
//!
//! // Two rows, bottom row first: black then white
//! let raster = RgbRaster::from_bottom_up(1, 2, vec![0, 0, 0, 255, 255, 255]).unwrap();
//! assert_eq!(raster.pixel(0, 0), [255, 255, 255]);
//! assert_eq!(raster.pixel(0, 1), [0, 0, 0]);
//! ```

use std::path::Path;

use image::{ImageFormat, RgbImage};
use thiserror::Error;

use crate::renderer::{RenderError, Renderer};

/// Errors from turning a raster into an image file.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to read back the frame: {0}")]
    Readback(#[from] RenderError),
    #[error("Pixel buffer holds {actual} bytes, {width}x{height} RGB needs {expected}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("Failed to write image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Row-major RGB8 pixels, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbRaster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RgbRaster {
    /// Builds a raster from rows stored bottom-first, flipping them.
    ///
    /// # Errors
    /// Returns [`CaptureError::BufferSize`] if `data` is not `width * height * 3` bytes.
    pub fn from_bottom_up(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CaptureError> {
        let stride = width as usize * 3;
        let expected = stride * height as usize;
        if data.len() != expected {
            return Err(CaptureError::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }

        Ok(RgbRaster {
            width,
            height,
            data: flip_rows(&data, stride),
        })
    }

    /// Returns the pixel at column `x`, row `y` counted from the top.
    ///
    /// # Panics
    /// Panics if the coordinates are outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Converts into an `image` buffer.
    ///
    /// # Errors
    /// Returns [`CaptureError::BufferSize`] if the buffer does not match the dimensions.
    pub fn into_image(self) -> Result<RgbImage, CaptureError> {
        let (width, height, actual) = (self.width, self.height, self.data.len());
        RgbImage::from_raw(width, height, self.data).ok_or(CaptureError::BufferSize {
            width,
            height,
            expected: width as usize * height as usize * 3,
            actual,
        })
    }

    /// Encodes the raster as PNG at `path`.
    ///
    /// # Errors
    /// Returns an error if the buffer is inconsistent or the file cannot be written.
    pub fn save_png(self, path: &Path) -> Result<(), CaptureError> {
        self.into_image()?.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

/// Reads the whole viewport of `renderer` and returns it top row first.
///
/// # Errors
/// Returns [`CaptureError::Readback`] if the renderer refuses the readback and
/// [`CaptureError::BufferSize`] if it hands back the wrong number of bytes.
pub fn capture<R: Renderer + ?Sized>(renderer: &R) -> Result<RgbRaster, CaptureError> {
    let (width, height) = renderer.viewport();
    let data = renderer.read_pixels(0, 0, width, height)?;
    RgbRaster::from_bottom_up(width, height, data)
}

fn flip_rows(data: &[u8], stride: usize) -> Vec<u8> {
    if stride == 0 {
        return Vec::new();
    }
    let mut flipped = Vec::with_capacity(data.len());
    for row in data.chunks_exact(stride).rev() {
        flipped.extend_from_slice(row);
    }
    flipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{FrameSetup, Primitive};

    /// Serves a fixed buffer regardless of the requested rectangle.
    struct FixedReadback {
        viewport: (u32, u32),
        pixels: Vec<u8>,
    }

    impl Renderer for FixedReadback {
        fn viewport(&self) -> (u32, u32) {
            self.viewport
        }

        fn begin_frame(&mut self, _setup: &FrameSetup) {}

        fn draw(&mut self, _primitive: &Primitive) {}

        fn read_pixels(
            &self,
            _x: u32,
            _y: u32,
            _width: u32,
            _height: u32,
        ) -> Result<Vec<u8>, RenderError> {
            Ok(self.pixels.clone())
        }
    }

    #[test]
    fn test_capture_flips_readback() {
        let renderer = FixedReadback {
            viewport: (1, 2),
            pixels: vec![1, 1, 1, 2, 2, 2],
        };
        let raster = capture(&renderer).unwrap();
        assert_eq!(raster.data, vec![2, 2, 2, 1, 1, 1]);
    }

    #[test]
    fn test_capture_rejects_short_readback() {
        let renderer = FixedReadback {
            viewport: (2, 2),
            pixels: vec![0; 9],
        };
        assert!(matches!(
            capture(&renderer),
            Err(CaptureError::BufferSize {
                expected: 12,
                actual: 9,
                ..
            })
        ));
    }

    #[test]
    fn test_flip_three_rows() {
        let raster = RgbRaster::from_bottom_up(
            2,
            3,
            vec![
                1, 1, 1, 2, 2, 2, // bottom
                3, 3, 3, 4, 4, 4, //
                5, 5, 5, 6, 6, 6, // top
            ],
        )
        .unwrap();
        assert_eq!(
            raster.data,
            vec![5, 5, 5, 6, 6, 6, 3, 3, 3, 4, 4, 4, 1, 1, 1, 2, 2, 2]
        );
        assert_eq!(raster.pixel(1, 0), [6, 6, 6]);
    }

    #[test]
    fn test_wrong_buffer_size() {
        let err = RgbRaster::from_bottom_up(2, 2, vec![0; 11]).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::BufferSize {
                expected: 12,
                actual: 11,
                ..
            }
        ));
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let raster = RgbRaster::from_bottom_up(1, 1, vec![0, 0, 0]).unwrap();
        let path = std::env::temp_dir()
            .join("stl-thumbnail-no-such-dir")
            .join("nested")
            .join("out.png");
        assert!(matches!(raster.save_png(&path), Err(CaptureError::Encode(_))));
    }
}
