//! The top-level error type for the thumbnail pipeline.
//!
//! Each stage has its own error enum; [`ThumbnailError`] wraps them so the
//! driver can propagate any of them with `?`.

use thiserror::Error;

use crate::capture::CaptureError;
use crate::formats::DecodeError;
use crate::renderer::RenderError;
use crate::scene::SceneError;

/// Everything that can stop a thumbnail from being produced.
#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("Unable to parse STL file: {0}")]
    Decode(#[from] DecodeError),
    #[error("Unable to frame model: {0}")]
    Scene(#[from] SceneError),
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
    #[error("{0}")]
    Capture(#[from] CaptureError),
}
