//! Error types for inkframe-capture.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from frame comparison and persistence.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A frame could not be decoded as PNG.
    #[error("frame decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// The frames cannot be compared pixel-by-pixel.
    #[error("frame dimensions differ: {previous} vs {current}")]
    DimensionMismatch { previous: String, current: String },
}

/// Convenience constructor for [`CaptureError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CaptureError {
    CaptureError::Io {
        path: path.into(),
        source,
    }
}
