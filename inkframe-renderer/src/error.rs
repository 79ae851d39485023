//! Error types for inkframe-renderer.

use thiserror::Error;

/// All errors that can arise from the renderer capability surface.
#[derive(Debug, Error)]
pub enum RendererError {
    /// The engine failed to load the target URL.
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// The engine failed to produce a frame of the current surface.
    #[error("frame capture failed: {0}")]
    Capture(String),

    /// The best-effort post-navigation login hook failed.
    #[error("login hook failed: {0}")]
    LoginHook(String),

    /// PNG encoding error inside the built-in test-card engine.
    #[error("frame encode error: {0}")]
    Encode(#[from] image::ImageError),
}
