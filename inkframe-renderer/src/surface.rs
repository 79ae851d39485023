//! The capability surface the orchestration core drives the browsing
//! engine through.

use std::fmt;

use crate::error::RendererError;

/// One captured frame: encoded PNG bytes of the renderer surface.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame(pub Vec<u8>);

impl Frame {
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Frame {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Pixel payloads are noise in logs; show the size only.
        f.debug_tuple("Frame")
            .field(&format_args!("{} bytes", self.0.len()))
            .finish()
    }
}

/// Narrow contract over the external browsing engine.
///
/// Implementations are driven from a single worker; calls are never
/// concurrent, because navigation changes what a concurrent capture would
/// observe.
pub trait Renderer: Send {
    /// Load `url` on the surface.
    fn navigate(&mut self, url: &str) -> Result<(), RendererError>;

    /// Capture the surface as an encoded PNG.
    fn capture_frame(&mut self) -> Result<Frame, RendererError>;

    /// Best-effort page-specific credential auto-fill, run after a
    /// successful navigation. Failure never aborts the tick.
    fn run_login_hook(&mut self) -> Result<(), RendererError>;
}
