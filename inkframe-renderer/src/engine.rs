//! Built-in test-card engine.
//!
//! Synthesizes a deterministic flat-color card per URL so the capture
//! pipeline can be exercised without a real browsing engine: the same URL
//! always produces the same frame, and different URLs differ in far more
//! than the capture gate's change threshold.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use crate::error::RendererError;
use crate::surface::{Frame, Renderer};

/// E-ink panel dimensions used when none are given.
pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 480;

/// Deterministic stand-in for the external browsing engine.
#[derive(Debug)]
pub struct TestCardRenderer {
    width: u32,
    height: u32,
    current_url: Option<String>,
    navigations: u64,
}

impl TestCardRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            current_url: None,
            navigations: 0,
        }
    }

    /// URL currently loaded on the surface, if any.
    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    /// Number of successful `navigate` calls.
    pub fn navigations(&self) -> u64 {
        self.navigations
    }
}

impl Default for TestCardRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Renderer for TestCardRenderer {
    fn navigate(&mut self, url: &str) -> Result<(), RendererError> {
        if url.trim().is_empty() {
            return Err(RendererError::Navigation {
                url: url.to_owned(),
                message: "empty URL".to_owned(),
            });
        }
        self.current_url = Some(url.to_owned());
        self.navigations += 1;
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<Frame, RendererError> {
        let seed = match &self.current_url {
            Some(url) => fnv1a(url.as_bytes()),
            // Blank surface before the first navigation.
            None => 0,
        };
        let base = Rgb([
            (seed >> 16) as u8,
            (seed >> 8) as u8,
            seed as u8,
        ]);
        let stripe = Rgb([
            base.0[0].wrapping_add(96),
            base.0[1],
            base.0[2].wrapping_add(160),
        ]);

        let stripe_width = (self.width / 8).max(1);
        let img = RgbImage::from_fn(self.width, self.height, |x, _| {
            if (x / stripe_width) % 2 == 0 {
                base
            } else {
                stripe
            }
        });

        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png)?;
        Ok(Frame(png.into_inner()))
    }

    fn run_login_hook(&mut self) -> Result<(), RendererError> {
        // The test card has no login form.
        Ok(())
    }
}

fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for &b in bytes {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_url_same_frame() {
        let mut engine = TestCardRenderer::new(80, 48);
        engine.navigate("http://dash.local/a").expect("navigate");
        let first = engine.capture_frame().expect("frame");
        let second = engine.capture_frame().expect("frame");
        assert_eq!(first, second);
    }

    #[test]
    fn different_urls_differ() {
        let mut engine = TestCardRenderer::new(80, 48);
        engine.navigate("http://dash.local/a").expect("navigate");
        let a = engine.capture_frame().expect("frame");
        engine.navigate("http://dash.local/b").expect("navigate");
        let b = engine.capture_frame().expect("frame");
        assert_ne!(a, b);
    }

    #[test]
    fn capture_before_navigation_is_blank_but_valid() {
        let mut engine = TestCardRenderer::new(80, 48);
        let frame = engine.capture_frame().expect("frame");
        let decoded = image::load_from_memory(frame.bytes()).expect("decode");
        assert_eq!(decoded.width(), 80);
        assert_eq!(decoded.height(), 48);
    }

    #[test]
    fn empty_url_is_a_navigation_error() {
        let mut engine = TestCardRenderer::default();
        let err = engine.navigate("  ").expect_err("empty URL");
        assert!(matches!(err, RendererError::Navigation { .. }));
        assert_eq!(engine.navigations(), 0);
    }
}
