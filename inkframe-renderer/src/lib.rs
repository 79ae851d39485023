//! # inkframe-renderer
//!
//! The renderer capability surface consumed by the orchestration core.
//!
//! The actual browsing engine (page navigation, login automation, pixel
//! capture) is an external collaborator; this crate defines the narrow
//! contract the core drives it through — [`Renderer`] — plus
//! [`TestCardRenderer`], a deterministic built-in engine used for
//! development and tests.
//!
//! ## Usage
//!
//! ```rust
//! use inkframe_renderer::{Renderer, TestCardRenderer};
//!
//! let mut engine = TestCardRenderer::new(800, 480);
//! engine.navigate("http://dash.local/photos").unwrap();
//! let frame = engine.capture_frame().unwrap();
//! assert!(!frame.bytes().is_empty());
//! ```

pub mod engine;
pub mod error;
pub mod surface;

pub use engine::TestCardRenderer;
pub use error::RendererError;
pub use surface::{Frame, Renderer};
